//! In-process session backend for `mem://` addresses.
//!
//! The engine enforces the protocol order (open, authenticate, select
//! context, query) and records every statement in a journal. Statements are
//! not interpreted; each one answers `OK` with a `null` value, except a blank
//! statement which answers `ERR` and is not recorded.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::{SessionError, SessionResult};
use crate::session::{QueryResponse, Session, Signin, StatementResult};

const MEMORY_SCHEME: &str = "mem://";
const MEMORY_ADDRESS: &str = "memory";

/// Statement recorded by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalEntry {
    pub namespace: String,
    pub database: String,
    pub statement: String,
}

enum Access {
    Open,
    Restricted {
        users: HashMap<String, String>,
        tokens: HashSet<String>,
    },
}

struct EngineState {
    access: Access,
    journal: Mutex<Vec<JournalEntry>>,
    open_sessions: AtomicUsize,
}

/// Shared in-memory backend. Cloning shares the same state.
#[derive(Clone)]
pub struct MemoryEngine {
    inner: Arc<EngineState>,
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::open()
    }
}

impl MemoryEngine {
    /// Engine that accepts any credentials.
    pub fn open() -> Self {
        Self::with_access(Access::Open)
    }

    /// Engine that only accepts registered users and tokens.
    pub fn restricted() -> MemoryEngineBuilder {
        MemoryEngineBuilder::default()
    }

    fn with_access(access: Access) -> Self {
        Self {
            inner: Arc::new(EngineState {
                access,
                journal: Mutex::new(Vec::new()),
                open_sessions: AtomicUsize::new(0),
            }),
        }
    }

    /// Create a fresh, unopened session on this engine.
    pub fn session(&self) -> MemorySession {
        MemorySession {
            engine: self.clone(),
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Session factory suitable for a [`DriverProvider`](crate::DriverProvider).
    pub fn connector(&self) -> impl Fn() -> MemorySession + Send + Sync + 'static {
        let engine = self.clone();
        move || engine.session()
    }

    /// Number of sessions opened and not yet closed.
    pub fn open_sessions(&self) -> usize {
        self.inner.open_sessions.load(Ordering::SeqCst)
    }

    /// All statements executed so far, oldest first.
    pub async fn journal(&self) -> Vec<JournalEntry> {
        self.inner.journal.lock().await.clone()
    }

    /// Statement texts executed so far, oldest first.
    pub async fn statements(&self) -> Vec<String> {
        self.inner
            .journal
            .lock()
            .await
            .iter()
            .map(|entry| entry.statement.clone())
            .collect()
    }

    fn accepts_token(&self, token: &str) -> bool {
        match &self.inner.access {
            Access::Open => true,
            Access::Restricted { tokens, .. } => tokens.contains(token),
        }
    }

    fn accepts_signin(&self, signin: &Signin) -> bool {
        match &self.inner.access {
            Access::Open => true,
            Access::Restricted { users, .. } => users
                .get(&signin.username)
                .is_some_and(|password| *password == signin.password),
        }
    }
}

/// Builder for a restricted [`MemoryEngine`].
#[derive(Default)]
pub struct MemoryEngineBuilder {
    users: HashMap<String, String>,
    tokens: HashSet<String>,
}

impl MemoryEngineBuilder {
    pub fn user(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.users.insert(username.into(), password.into());
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.tokens.insert(token.into());
        self
    }

    pub fn build(self) -> MemoryEngine {
        MemoryEngine::with_access(Access::Restricted {
            users: self.users,
            tokens: self.tokens,
        })
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum Phase {
    #[default]
    Closed,
    Open,
    Authenticated,
}

#[derive(Debug, Default)]
struct SessionState {
    phase: Phase,
    context: Option<(String, String)>,
}

/// One session against a [`MemoryEngine`].
pub struct MemorySession {
    engine: MemoryEngine,
    state: Mutex<SessionState>,
}

impl MemorySession {
    /// Whether `address` names the in-process engine.
    pub fn serves(address: &str) -> bool {
        address.starts_with(MEMORY_SCHEME) || address == MEMORY_ADDRESS
    }

    fn check_address(address: &str) -> SessionResult<()> {
        if Self::serves(address) {
            Ok(())
        } else {
            Err(SessionError::transport(format!(
                "unsupported address '{}', expected {}<name>",
                address, MEMORY_SCHEME
            )))
        }
    }
}

#[async_trait]
impl Session for MemorySession {
    async fn connect(&self, address: &str) -> SessionResult<()> {
        Self::check_address(address)?;

        let mut state = self.state.lock().await;
        if state.phase == Phase::Closed {
            self.engine.inner.open_sessions.fetch_add(1, Ordering::SeqCst);
        }
        state.phase = Phase::Open;
        state.context = None;
        Ok(())
    }

    async fn authenticate(&self, token: &str) -> SessionResult<()> {
        let mut state = self.state.lock().await;
        if state.phase == Phase::Closed {
            return Err(SessionError::NotConnected);
        }
        if !self.engine.accepts_token(token) {
            return Err(SessionError::rejected("invalid token"));
        }

        state.phase = Phase::Authenticated;
        Ok(())
    }

    async fn signin(&self, credentials: &Signin) -> SessionResult<()> {
        let mut state = self.state.lock().await;
        if state.phase == Phase::Closed {
            return Err(SessionError::NotConnected);
        }
        if !self.engine.accepts_signin(credentials) {
            return Err(SessionError::rejected(format!(
                "invalid credentials for user '{}'",
                credentials.username
            )));
        }

        state.phase = Phase::Authenticated;
        Ok(())
    }

    async fn use_ns(&self, namespace: &str, database: &str) -> SessionResult<()> {
        let mut state = self.state.lock().await;
        match state.phase {
            Phase::Closed => Err(SessionError::NotConnected),
            Phase::Open => Err(SessionError::Unauthenticated),
            Phase::Authenticated => {
                state.context = Some((namespace.to_string(), database.to_string()));
                Ok(())
            }
        }
    }

    async fn query(&self, statement: &str) -> SessionResult<QueryResponse> {
        let started = Instant::now();

        let (namespace, database) = {
            let state = self.state.lock().await;
            match (state.phase, &state.context) {
                (Phase::Closed, _) => return Err(SessionError::NotConnected),
                (Phase::Open, _) => return Err(SessionError::Unauthenticated),
                (Phase::Authenticated, None) => return Err(SessionError::NoContext),
                (Phase::Authenticated, Some(context)) => context.clone(),
            }
        };

        if statement.trim().is_empty() {
            let result = StatementResult::err("Parse error: empty statement")
                .with_time(format!("{:?}", started.elapsed()));
            return Ok(QueryResponse::new(vec![result]));
        }

        tracing::debug!(%namespace, %database, statement, "Executing statement");
        self.engine.inner.journal.lock().await.push(JournalEntry {
            namespace,
            database,
            statement: statement.to_string(),
        });

        let result = StatementResult::ok(Value::Null).with_time(format!("{:?}", started.elapsed()));
        Ok(QueryResponse::new(vec![result]))
    }

    async fn close(&self) -> SessionResult<()> {
        let mut state = self.state.lock().await;
        if state.phase == Phase::Closed {
            return Err(SessionError::NotConnected);
        }

        state.phase = Phase::Closed;
        state.context = None;
        self.engine.inner.open_sessions.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}
