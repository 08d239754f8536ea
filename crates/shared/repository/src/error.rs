//! Repository errors.

use driver::SessionError;
use thiserror::Error;

/// Errors raised by repositories.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The connection handed to the repository has no established session
    #[error("Invalid connection passed to repository: no established session")]
    InvalidConnection,

    /// Statement execution failed in the session, passed through as reported
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A statement came back with an error status
    #[error("Statement {index} failed: {message}")]
    Statement { index: usize, message: String },

    #[error("Failed to decode query result: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Result type alias
pub type RepositoryResult<T> = Result<T, RepositoryError>;
