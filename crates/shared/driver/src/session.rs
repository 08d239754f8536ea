//! Session protocol spoken by database clients.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SessionResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Capability set of a database client.
///
/// The driver only ever calls these in the order
/// `connect -> authenticate | signin -> use_ns`, then `query` any number of
/// times, then `close`.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait Session: Send + Sync {
    /// Open the transport to `address`
    async fn connect(&self, address: &str) -> SessionResult<()>;

    /// Authenticate with a bearer token
    async fn authenticate(&self, token: &str) -> SessionResult<()>;

    /// Authenticate with a username/password pair
    async fn signin(&self, credentials: &Signin) -> SessionResult<()>;

    /// Select the namespace and database for subsequent statements
    async fn use_ns(&self, namespace: &str, database: &str) -> SessionResult<()>;

    /// Execute a statement
    async fn query(&self, statement: &str) -> SessionResult<QueryResponse>;

    /// Close the transport
    async fn close(&self) -> SessionResult<()>;
}

/// A value that can lend out a usable session.
///
/// Returns `None` when no session is established, which is how repositories
/// refuse to wrap a disconnected handle. The loan is tied to the borrow of
/// the holder, so nothing built from it can outlive the holder.
pub trait SessionHolder<S> {
    fn session(&self) -> Option<&S>;
}

/// Username/password pair used by `signin`.
#[derive(Clone, PartialEq, Eq)]
pub struct Signin {
    pub username: String,
    pub password: String,
}

impl Signin {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Signin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signin")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Outcome status of a single statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Ok,
    Err,
}

/// Result of one statement within a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementResult {
    pub status: Status,
    pub time: String,
    pub result: Value,
}

impl StatementResult {
    /// Successful statement carrying `result`
    pub fn ok(result: Value) -> Self {
        Self {
            status: Status::Ok,
            time: String::new(),
            result,
        }
    }

    /// Failed statement; the message travels in `result`
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            status: Status::Err,
            time: String::new(),
            result: Value::String(message.into()),
        }
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = time.into();
        self
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

/// Raw response to a query: one entry per executed statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryResponse {
    statements: Vec<StatementResult>,
}

impl QueryResponse {
    pub fn new(statements: Vec<StatementResult>) -> Self {
        Self { statements }
    }

    pub fn statements(&self) -> &[StatementResult] {
        &self.statements
    }

    pub fn into_statements(self) -> Vec<StatementResult> {
        self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

impl From<Vec<StatementResult>> for QueryResponse {
    fn from(statements: Vec<StatementResult>) -> Self {
        Self::new(statements)
    }
}
