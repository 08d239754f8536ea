//! Connection parameters and credential admission.

use std::fmt;

use crate::error::{DriverError, DriverResult};
use crate::session::Signin;

/// Parameters captured once and used for every connection.
#[derive(Clone, Default)]
pub struct DriverConfig {
    pub address: String,
    pub namespace: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
}

impl fmt::Debug for DriverConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverConfig")
            .field("address", &self.address)
            .field("namespace", &self.namespace)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl DriverConfig {
    /// Create a config without credentials.
    pub fn new(
        address: impl Into<String>,
        namespace: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            namespace: namespace.into(),
            database: database.into(),
            ..Default::default()
        }
    }

    /// Set the username/password pair.
    pub fn with_signin(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set the bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Resolve the credentials used by `connect`.
    ///
    /// A non-empty token takes precedence over a username/password pair.
    /// Fails when neither a token nor a complete pair is configured.
    pub fn credentials(&self) -> DriverResult<Credentials> {
        let token = self.token.as_deref().filter(|t| !t.is_empty());

        match (token, &self.username, &self.password) {
            (Some(token), _, _) => Ok(Credentials::Token(token.to_string())),
            (None, Some(username), Some(password)) => {
                Ok(Credentials::Signin(Signin::new(username, password)))
            }
            _ => Err(DriverError::AuthenticationConfig),
        }
    }
}

/// How a driver authenticates.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Token(String),
    Signin(Signin),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Token(_) => f.write_str("Token([REDACTED])"),
            Credentials::Signin(signin) => f.debug_tuple("Signin").field(signin).finish(),
        }
    }
}
