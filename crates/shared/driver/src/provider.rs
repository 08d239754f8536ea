//! Scoped driver acquisition.
//!
//! Every connect made here is paired with exactly one close, whether the
//! consumer returns, fails or is cancelled.

use std::fmt;
use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::pin::Pin;
use std::sync::Arc;

use crate::config::DriverConfig;
use crate::driver::Driver;
use crate::error::{DriverError, DriverResult};
use crate::session::Session;

type Connector<S> = dyn Fn() -> S + Send + Sync;

/// Builds connected drivers from parameters captured once.
pub struct DriverProvider<S> {
    config: Arc<DriverConfig>,
    connector: Arc<Connector<S>>,
}

impl<S> Clone for DriverProvider<S> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            connector: Arc::clone(&self.connector),
        }
    }
}

impl<S: Session + 'static> DriverProvider<S> {
    /// Capture `config`; `connector` yields a fresh session per acquisition.
    pub fn new<F>(config: DriverConfig, connector: F) -> Self
    where
        F: Fn() -> S + Send + Sync + 'static,
    {
        Self {
            config: Arc::new(config),
            connector: Arc::new(connector),
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Construct and connect a new driver.
    ///
    /// The returned guard must be ended with [`ScopedDriver::release`];
    /// dropping it instead schedules the close on the current runtime.
    pub async fn acquire(&self) -> DriverResult<ScopedDriver<S>> {
        let driver = Driver::new(&self.config, (self.connector)())?;
        let mut scoped = ScopedDriver { driver };

        if let Err(e) = scoped.driver.connect().await {
            // No-op unless connected, kept so every acquisition ends in release
            if let Err(close_err) = scoped.release().await {
                tracing::error!("Failed to close database session: {}", close_err);
            }
            return Err(e);
        }

        Ok(scoped)
    }

    /// Run `f` with a connected driver, closing it before returning.
    ///
    /// A close failure is logged and does not replace the result of `f`.
    pub async fn scope<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: for<'a> FnOnce(
                &'a Driver<S>,
            ) -> Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>
            + Send,
        E: From<DriverError>,
    {
        let mut driver = self.acquire().await?;

        let outcome = f(&*driver).await;

        if let Err(e) = driver.release().await {
            tracing::error!("Failed to close database session: {}", e);
        }

        outcome
    }
}

/// A connected driver that closes itself.
///
/// Dereferences to [`Driver`]. Call [`release`](Self::release) to close the
/// session in place; if the guard is dropped while still connected the close
/// is spawned on the current tokio runtime.
pub struct ScopedDriver<S: Session + 'static> {
    driver: Driver<S>,
}

impl<S: Session + 'static> ScopedDriver<S> {
    /// Close the session. Safe to call more than once.
    pub async fn release(&mut self) -> DriverResult<()> {
        self.driver.close().await
    }
}

impl<S: Session + 'static> fmt::Debug for ScopedDriver<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ScopedDriver").field(&self.driver).finish()
    }
}

impl<S: Session + 'static> Deref for ScopedDriver<S> {
    type Target = Driver<S>;

    fn deref(&self) -> &Self::Target {
        &self.driver
    }
}

impl<S: Session + 'static> DerefMut for ScopedDriver<S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.driver
    }
}

impl<S: Session + 'static> Drop for ScopedDriver<S> {
    fn drop(&mut self) {
        let Some(session) = self.driver.detach() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::debug!(address = %self.driver.address(), "Closing abandoned database session");
                handle.spawn(async move {
                    if let Err(e) = session.close().await {
                        tracing::error!("Failed to close abandoned database session: {}", e);
                    }
                });
            }
            Err(_) => {
                tracing::warn!(
                    address = %self.driver.address(),
                    "Database session dropped outside a runtime; close skipped"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionError;
    use crate::memory::MemoryEngine;
    use crate::session::MockSession;

    fn config() -> DriverConfig {
        DriverConfig::new("mem://test", "n1", "d1").with_signin("u", "p")
    }

    #[tokio::test]
    async fn test_acquire_and_release() {
        let engine = MemoryEngine::open();
        let provider = DriverProvider::new(config(), engine.connector());

        let mut driver = provider.acquire().await.unwrap();
        assert!(driver.is_connected());
        assert_eq!(engine.open_sessions(), 1);

        driver.release().await.unwrap();
        assert!(!driver.is_connected());
        assert_eq!(engine.open_sessions(), 0);

        // Second release is a no-op
        driver.release().await.unwrap();
    }

    #[tokio::test]
    async fn test_each_acquire_builds_fresh_driver() {
        let engine = MemoryEngine::open();
        let provider = DriverProvider::new(config(), engine.connector());

        let mut first = provider.acquire().await.unwrap();
        let mut second = provider.acquire().await.unwrap();
        assert_eq!(engine.open_sessions(), 2);

        first.release().await.unwrap();
        second.release().await.unwrap();
        assert_eq!(engine.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_acquire_without_credentials_fails_before_io() {
        let provider = DriverProvider::new(
            DriverConfig::new("mem://test", "n1", "d1"),
            MockSession::new,
        );

        let result = provider.acquire().await;
        assert!(matches!(result, Err(DriverError::AuthenticationConfig)));
    }

    #[tokio::test]
    async fn test_token_only_provider_authenticates_by_token() {
        let provider = DriverProvider::new(
            DriverConfig::new("mem://test", "n1", "d1").with_token("tok123"),
            || {
                let mut session = MockSession::new();
                session.expect_connect().times(1).returning(|_| Ok(()));
                session
                    .expect_authenticate()
                    .withf(|token| token == "tok123")
                    .times(1)
                    .returning(|_| Ok(()));
                session.expect_signin().never();
                session.expect_use_ns().times(1).returning(|_, _| Ok(()));
                session.expect_close().times(1).returning(|| Ok(()));
                session
            },
        );

        let mut driver = provider.acquire().await.unwrap();
        assert!(driver.is_connected());
        driver.release().await.unwrap();
    }

    #[tokio::test]
    async fn test_scope_closes_after_success() {
        let engine = MemoryEngine::open();
        let provider = DriverProvider::new(config(), engine.connector());

        let namespace = provider
            .scope(|driver| {
                Box::pin(async move {
                    assert!(driver.is_connected());
                    Ok::<_, DriverError>(driver.namespace().to_string())
                })
            })
            .await
            .unwrap();

        assert_eq!(namespace, "n1");
        assert_eq!(engine.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_scope_closes_after_error() {
        let engine = MemoryEngine::open();
        let provider = DriverProvider::new(config(), engine.connector());

        let result: Result<(), DriverError> = provider
            .scope(|_driver| {
                Box::pin(async move { Err(DriverError::from(SessionError::query("boom"))) })
            })
            .await;

        assert!(result.is_err());
        assert_eq!(engine.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_scope_reports_authentication_failure() {
        let engine = MemoryEngine::restricted().user("u", "other").build();
        let provider = DriverProvider::new(config(), engine.connector());

        let result: Result<(), DriverError> = provider
            .scope(|_driver| Box::pin(async move { Ok::<_, DriverError>(()) }))
            .await;

        assert!(matches!(result, Err(DriverError::Authentication(_))));
        assert_eq!(engine.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_release_failure_does_not_replace_result() {
        let provider = DriverProvider::new(config(), || {
            let mut session = MockSession::new();
            session.expect_connect().returning(|_| Ok(()));
            session.expect_signin().returning(|_| Ok(()));
            session.expect_use_ns().returning(|_, _| Ok(()));
            session
                .expect_close()
                .times(1)
                .returning(|| Err(SessionError::transport("broken pipe")));
            session
        });

        let value = provider
            .scope(|_driver| Box::pin(async move { Ok::<_, DriverError>(42) }))
            .await
            .unwrap();

        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_dropped_guard_closes_session() {
        let engine = MemoryEngine::open();
        let provider = DriverProvider::new(config(), engine.connector());

        let driver = provider.acquire().await.unwrap();
        assert_eq!(engine.open_sessions(), 1);
        drop(driver);

        tokio::time::timeout(std::time::Duration::from_secs(1), async {
            while engine.open_sessions() > 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("abandoned session was not closed");
    }

    #[test]
    fn test_guard_dropped_outside_runtime_skips_close() {
        let engine = MemoryEngine::open();
        let provider = DriverProvider::new(config(), engine.connector());
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();

        let driver = runtime.block_on(provider.acquire()).unwrap();
        assert!(driver.is_connected());

        // No runtime is current here, so nothing can run the close
        drop(driver);
        assert_eq!(engine.open_sessions(), 1);
    }
}
