//! SurrealDB client session for `ws://`, `wss://`, `http://` and `https://`
//! addresses.

use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;
use tokio::sync::Mutex;

use crate::error::{SessionError, SessionResult};
use crate::session::{QueryResponse, Session, Signin, StatementResult};

/// One client connection to a SurrealDB server.
///
/// The client exists between `connect` and `close`; dropping it on close
/// shuts the transport down.
#[derive(Default)]
pub struct SurrealSession {
    client: Mutex<Option<Surreal<Any>>>,
}

impl SurrealSession {
    pub fn new() -> Self {
        Self::default()
    }

    async fn client(&self) -> SessionResult<Surreal<Any>> {
        self.client
            .lock()
            .await
            .clone()
            .ok_or(SessionError::NotConnected)
    }
}

fn query_error(e: surrealdb::Error) -> SessionError {
    SessionError::query(e.to_string())
}

#[async_trait]
impl Session for SurrealSession {
    async fn connect(&self, address: &str) -> SessionResult<()> {
        let client = any::connect(address)
            .await
            .map_err(|e| SessionError::transport(e.to_string()))?;

        *self.client.lock().await = Some(client);
        Ok(())
    }

    async fn authenticate(&self, token: &str) -> SessionResult<()> {
        self.client()
            .await?
            .authenticate(token.to_string())
            .await
            .map_err(|e| SessionError::rejected(e.to_string()))
    }

    async fn signin(&self, credentials: &Signin) -> SessionResult<()> {
        self.client()
            .await?
            .signin(Root {
                username: &credentials.username,
                password: &credentials.password,
            })
            .await
            .map(|_| ())
            .map_err(|e| SessionError::rejected(e.to_string()))
    }

    async fn use_ns(&self, namespace: &str, database: &str) -> SessionResult<()> {
        self.client()
            .await?
            .use_ns(namespace)
            .use_db(database)
            .await
            .map_err(query_error)
    }

    async fn query(&self, statement: &str) -> SessionResult<QueryResponse> {
        let client = self.client().await?;
        let started = Instant::now();

        tracing::debug!(statement, "Executing statement");
        let mut response = client.query(statement).await.map_err(query_error)?;
        let time = format!("{:?}", started.elapsed());

        let count = response.num_statements();
        let mut errors = response.take_errors();
        let mut results = Vec::with_capacity(count);

        for index in 0..count {
            let result = match errors.remove(&index) {
                Some(e) => StatementResult::err(e.to_string()),
                None => {
                    let values: Vec<Value> = response.take(index).map_err(query_error)?;
                    StatementResult::ok(Value::Array(values))
                }
            };
            results.push(result.with_time(time.clone()));
        }

        Ok(QueryResponse::new(results))
    }

    async fn close(&self) -> SessionResult<()> {
        self.client
            .lock()
            .await
            .take()
            .map(drop)
            .ok_or(SessionError::NotConnected)
    }
}
