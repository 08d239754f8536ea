//! Per-request repository construction.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;

use driver::{Driver, DriverError, DriverProvider, Session};

use crate::base::{FromConnection, RepositoryKind};
use crate::error::{RepositoryError, RepositoryResult};

/// Builds a fresh repository of kind `K` for every request from a
/// [`DriverProvider`].
///
/// Nothing is cached: each [`scope`](Self::scope) acquires its own driver,
/// lends it to a new repository and releases the driver when done. The
/// repository borrows the driver, so it cannot escape the scope.
pub struct RepositoryProvider<K, S> {
    drivers: DriverProvider<S>,
    _kind: PhantomData<fn() -> K>,
}

impl<K, S> Clone for RepositoryProvider<K, S> {
    fn clone(&self) -> Self {
        Self {
            drivers: self.drivers.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K, S> RepositoryProvider<K, S>
where
    K: RepositoryKind<S>,
    S: Session + 'static,
{
    pub fn new(drivers: DriverProvider<S>) -> Self {
        Self {
            drivers,
            _kind: PhantomData,
        }
    }

    pub fn drivers(&self) -> &DriverProvider<S> {
        &self.drivers
    }

    /// Build a repository over an explicitly supplied driver.
    pub fn resolve<'a>(&self, driver: &'a Driver<S>) -> RepositoryResult<K::Repository<'a>> {
        <K::Repository<'a> as FromConnection<'a, S>>::from_connection(driver)
    }

    /// Acquire a driver, build a repository over it and run `f`.
    ///
    /// The driver is released before returning, whatever `f` yields.
    pub async fn scope<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: for<'a> FnOnce(
                K::Repository<'a>,
            ) -> Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>
            + Send,
        E: From<DriverError> + From<RepositoryError>,
    {
        let mut driver = self.drivers.acquire().await?;

        let outcome = match self.resolve(&driver) {
            Ok(repository) => f(repository).await,
            Err(e) => Err(e.into()),
        };

        if let Err(e) = driver.release().await {
            tracing::error!("Failed to close database session: {}", e);
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Base;
    use driver::{DriverConfig, MemoryEngine, MemorySession};

    #[derive(Debug)]
    enum TestError {
        Driver(DriverError),
        Repository(RepositoryError),
    }

    impl From<DriverError> for TestError {
        fn from(err: DriverError) -> Self {
            TestError::Driver(err)
        }
    }

    impl From<RepositoryError> for TestError {
        fn from(err: RepositoryError) -> Self {
            TestError::Repository(err)
        }
    }

    fn provider(engine: &MemoryEngine) -> RepositoryProvider<Base, MemorySession> {
        let config = DriverConfig::new("mem://test", "n1", "d1").with_signin("u", "p");
        RepositoryProvider::new(DriverProvider::new(config, engine.connector()))
    }

    #[tokio::test]
    async fn test_resolve_over_connected_driver() {
        let engine = MemoryEngine::open();
        let repositories = provider(&engine);

        let mut driver = repositories.drivers().acquire().await.unwrap();
        let repo = repositories.resolve(&driver).unwrap();
        repo.begin_transaction().await.unwrap();

        driver.release().await.unwrap();
        assert_eq!(engine.statements().await, vec!["BEGIN TRANSACTION"]);
    }

    #[tokio::test]
    async fn test_resolve_over_released_driver_fails() {
        let engine = MemoryEngine::open();
        let repositories = provider(&engine);

        let mut driver = repositories.drivers().acquire().await.unwrap();
        driver.release().await.unwrap();

        let result = repositories.resolve(&driver);
        assert!(matches!(result, Err(RepositoryError::InvalidConnection)));
    }

    #[tokio::test]
    async fn test_scope_releases_driver() {
        let engine = MemoryEngine::open();
        let repositories = provider(&engine);
        let observer = engine.clone();

        repositories
            .scope(|repo| {
                Box::pin(async move {
                    assert_eq!(observer.open_sessions(), 1);
                    repo.begin_transaction().await?;
                    repo.commit_transaction().await?;
                    Ok::<_, TestError>(())
                })
            })
            .await
            .unwrap();

        assert_eq!(engine.open_sessions(), 0);
        assert_eq!(
            engine.statements().await,
            vec!["BEGIN TRANSACTION", "COMMIT TRANSACTION"]
        );
    }

    #[tokio::test]
    async fn test_scope_surfaces_driver_errors() {
        let engine = MemoryEngine::restricted().token("other").build();
        let repositories = provider(&engine);

        let result = repositories
            .scope(|_repo| Box::pin(async move { Ok::<_, TestError>(()) }))
            .await;

        assert!(matches!(
            result,
            Err(TestError::Driver(DriverError::Authentication(_)))
        ));
    }
}
