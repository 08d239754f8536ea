//! Session backend chosen by address scheme.

use async_trait::async_trait;

use crate::error::SessionResult;
use crate::memory::{MemoryEngine, MemorySession};
#[cfg(feature = "surrealdb")]
use crate::remote::SurrealSession;
use crate::session::{QueryResponse, Session, Signin};

/// A session against whichever backend serves an address.
///
/// `mem://` and `memory` addresses go to the in-process engine. Anything else
/// goes to a SurrealDB server when the `surrealdb` feature is enabled; without
/// it the in-process engine refuses the address with a transport error.
pub enum Backend {
    Memory(MemorySession),
    #[cfg(feature = "surrealdb")]
    Remote(SurrealSession),
}

impl Backend {
    /// Fresh, unconnected session for `address`.
    pub fn for_address(address: &str, engine: &MemoryEngine) -> Self {
        if MemorySession::serves(address) {
            Backend::Memory(engine.session())
        } else {
            Self::server(address, engine)
        }
    }

    #[cfg(feature = "surrealdb")]
    fn server(_address: &str, _engine: &MemoryEngine) -> Self {
        Backend::Remote(SurrealSession::new())
    }

    #[cfg(not(feature = "surrealdb"))]
    fn server(address: &str, engine: &MemoryEngine) -> Self {
        tracing::debug!(address, "Built without the surrealdb feature; using the in-process engine");
        Backend::Memory(engine.session())
    }

    /// Connector yielding [`for_address`](Self::for_address) sessions.
    pub fn connector(
        address: impl Into<String>,
        engine: MemoryEngine,
    ) -> impl Fn() -> Backend + Send + Sync + 'static {
        let address = address.into();
        move || Backend::for_address(&address, &engine)
    }

    pub fn is_memory(&self) -> bool {
        matches!(self, Backend::Memory(_))
    }
}

#[async_trait]
impl Session for Backend {
    async fn connect(&self, address: &str) -> SessionResult<()> {
        match self {
            Backend::Memory(session) => session.connect(address).await,
            #[cfg(feature = "surrealdb")]
            Backend::Remote(session) => session.connect(address).await,
        }
    }

    async fn authenticate(&self, token: &str) -> SessionResult<()> {
        match self {
            Backend::Memory(session) => session.authenticate(token).await,
            #[cfg(feature = "surrealdb")]
            Backend::Remote(session) => session.authenticate(token).await,
        }
    }

    async fn signin(&self, credentials: &Signin) -> SessionResult<()> {
        match self {
            Backend::Memory(session) => session.signin(credentials).await,
            #[cfg(feature = "surrealdb")]
            Backend::Remote(session) => session.signin(credentials).await,
        }
    }

    async fn use_ns(&self, namespace: &str, database: &str) -> SessionResult<()> {
        match self {
            Backend::Memory(session) => session.use_ns(namespace, database).await,
            #[cfg(feature = "surrealdb")]
            Backend::Remote(session) => session.use_ns(namespace, database).await,
        }
    }

    async fn query(&self, statement: &str) -> SessionResult<QueryResponse> {
        match self {
            Backend::Memory(session) => session.query(statement).await,
            #[cfg(feature = "surrealdb")]
            Backend::Remote(session) => session.query(statement).await,
        }
    }

    async fn close(&self) -> SessionResult<()> {
        match self {
            Backend::Memory(session) => session.close().await,
            #[cfg(feature = "surrealdb")]
            Backend::Remote(session) => session.close().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_addresses_use_engine() {
        let engine = MemoryEngine::open();

        assert!(Backend::for_address("mem://app", &engine).is_memory());
        assert!(Backend::for_address("memory", &engine).is_memory());
    }

    #[cfg(feature = "surrealdb")]
    #[test]
    fn test_server_addresses_use_client() {
        let engine = MemoryEngine::open();

        assert!(!Backend::for_address("ws://localhost:8000", &engine).is_memory());
        assert!(!Backend::for_address("https://db.example.com", &engine).is_memory());
    }

    #[cfg(not(feature = "surrealdb"))]
    #[tokio::test]
    async fn test_server_addresses_refused_without_client() {
        let engine = MemoryEngine::open();
        let session = Backend::for_address("ws://localhost:8000", &engine);

        let result = session.connect("ws://localhost:8000").await;
        assert!(matches!(result, Err(crate::error::SessionError::Transport(_))));
    }

    #[tokio::test]
    async fn test_connector_yields_fresh_sessions() {
        let engine = MemoryEngine::open();
        let connector = Backend::connector("mem://app", engine.clone());

        let first = connector();
        let second = connector();
        first.connect("mem://app").await.unwrap();
        second.connect("mem://app").await.unwrap();
        assert_eq!(engine.open_sessions(), 2);

        first.close().await.unwrap();
        assert_eq!(second.close().await, Ok(()));
        assert_eq!(engine.open_sessions(), 0);
    }
}
