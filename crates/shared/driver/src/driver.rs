//! Connection handle: one authenticated session for a bounded scope.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{Credentials, DriverConfig};
use crate::error::{DriverError, DriverResult};
use crate::session::{Session, SessionHolder};

/// Owns one session together with its namespace/database context and
/// credentials.
///
/// Construction validates credentials but performs no I/O. `connect` opens,
/// authenticates and selects the context; `close` is a no-op unless connected.
pub struct Driver<S> {
    session: Arc<S>,
    address: String,
    namespace: String,
    database: String,
    credentials: Credentials,
    connected: bool,
}

impl<S> fmt::Debug for Driver<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("address", &self.address)
            .field("namespace", &self.namespace)
            .field("database", &self.database)
            .field("credentials", &self.credentials)
            .field("connected", &self.connected)
            .finish()
    }
}

impl<S: Session> Driver<S> {
    /// Create a driver around `session`.
    ///
    /// Fails with [`DriverError::AuthenticationConfig`] when neither a token
    /// nor a complete username/password pair is configured.
    pub fn new(config: &DriverConfig, session: S) -> DriverResult<Self> {
        let credentials = config.credentials()?;

        Ok(Self {
            session: Arc::new(session),
            address: config.address.clone(),
            namespace: config.namespace.clone(),
            database: config.database.clone(),
            credentials,
            connected: false,
        })
    }

    /// Open the session, authenticate, then select namespace and database.
    ///
    /// Authentication failures are reported as [`DriverError::Authentication`];
    /// transport and context failures pass through as [`DriverError::Session`].
    /// Calling this on a connected driver runs the whole sequence again.
    ///
    /// When login or context selection fails the half-open transport is
    /// shut down here; the driver stays not connected and `close` remains a
    /// no-op.
    pub async fn connect(&mut self) -> DriverResult<()> {
        debug!(address = %self.address, "Opening database session");
        self.session.connect(&self.address).await?;

        if let Err(e) = self.establish().await {
            self.connected = false;
            if let Err(close_err) = self.session.close().await {
                warn!("Failed to shut down half-open session: {}", close_err);
            }
            return Err(e);
        }
        self.connected = true;

        info!(
            address = %self.address,
            namespace = %self.namespace,
            database = %self.database,
            "Database session established"
        );
        Ok(())
    }

    async fn establish(&self) -> DriverResult<()> {
        self.login().await?;
        self.session.use_ns(&self.namespace, &self.database).await?;
        Ok(())
    }

    async fn login(&self) -> DriverResult<()> {
        let outcome = match &self.credentials {
            Credentials::Token(token) => {
                debug!("Authenticating with token");
                self.session.authenticate(token).await
            }
            Credentials::Signin(signin) => {
                debug!(username = %signin.username, "Signing in");
                self.session.signin(signin).await
            }
        };

        outcome.map_err(DriverError::Authentication)
    }

    /// Close the session if connected.
    ///
    /// The connected flag is cleared before the transport is closed, so a
    /// failing close still leaves the driver closed.
    pub async fn close(&mut self) -> DriverResult<()> {
        if !self.connected {
            return Ok(());
        }

        self.connected = false;
        self.session.close().await?;

        info!(address = %self.address, "Database session closed");
        Ok(())
    }

    /// Mark the driver closed and hand out the session so the caller can
    /// close it elsewhere. `None` when not connected.
    pub(crate) fn detach(&mut self) -> Option<Arc<S>> {
        if !self.connected {
            return None;
        }

        self.connected = false;
        Some(Arc::clone(&self.session))
    }
}

impl<S> Driver<S> {
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn database(&self) -> &str {
        &self.database
    }
}

impl<S> SessionHolder<S> for Driver<S> {
    fn session(&self) -> Option<&S> {
        self.connected.then_some(&*self.session)
    }
}
