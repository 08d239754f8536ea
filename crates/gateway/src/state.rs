//! Application state for dependency injection.

use driver::{Backend, DriverProvider, MemoryEngine};
use repository::RepositoryProvider;

use crate::config::GatewayConfig;
use crate::repositories::Statements;

/// Per-request statement repositories.
pub type StatementRepositories = RepositoryProvider<Statements, Backend>;

/// Application state shared across handlers.
///
/// Holds only factories; every request opens and closes its own session.
#[derive(Clone)]
pub struct AppState {
    pub statements: StatementRepositories,
    pub config: GatewayConfig,
}

impl AppState {
    /// Create new app state.
    ///
    /// The backend is chosen from `DATABASE_ADDRESS`: `mem://` addresses are
    /// served by `engine`, server addresses by the SurrealDB client.
    pub fn new(config: GatewayConfig, engine: MemoryEngine) -> Self {
        let connector = Backend::connector(config.database.address.clone(), engine);
        let drivers = DriverProvider::new(config.database.clone().into(), connector);

        Self {
            statements: RepositoryProvider::new(drivers),
            config,
        }
    }
}
