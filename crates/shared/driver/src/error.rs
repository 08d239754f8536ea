//! Driver and session errors.
//!
//! [`SessionError`] is what a database client reports. [`DriverError`] is what
//! the driver surfaces: authentication failures are wrapped, everything else
//! passes through untouched.

use thiserror::Error;

/// Errors reported by a [`Session`](crate::Session) implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The transport could not be opened or broke down
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server refused the supplied credentials
    #[error("Credentials rejected: {0}")]
    Rejected(String),

    #[error("Session is not connected")]
    NotConnected,

    #[error("Session is not authenticated")]
    Unauthenticated,

    #[error("No namespace or database selected")]
    NoContext,

    /// Statement execution failed at the transport level
    #[error("Query failed: {0}")]
    Query(String),
}

impl SessionError {
    pub fn transport(msg: impl Into<String>) -> Self {
        SessionError::Transport(msg.into())
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        SessionError::Rejected(msg.into())
    }

    pub fn query(msg: impl Into<String>) -> Self {
        SessionError::Query(msg.into())
    }
}

/// Driver lifecycle errors.
#[derive(Error, Debug)]
pub enum DriverError {
    /// Neither a token nor a complete username/password pair was configured
    #[error("Provide either a token or both username and password")]
    AuthenticationConfig,

    /// The authenticate step of `connect` failed
    #[error("Authentication failed: {0}")]
    Authentication(#[source] SessionError),

    /// Transport or context failure, propagated as reported
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl DriverError {
    /// Underlying session error, if any.
    pub fn session_error(&self) -> Option<&SessionError> {
        match self {
            DriverError::AuthenticationConfig => None,
            DriverError::Authentication(e) | DriverError::Session(e) => Some(e),
        }
    }
}

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Result type alias for driver operations
pub type DriverResult<T> = Result<T, DriverError>;
