//! Repository layer - transaction control over a driver's session.
//!
//! Repositories borrow the session of a connected [`Driver`](driver::Driver)
//! for the length of one request scope. They own nothing and need no
//! teardown; the driver's scope closes the connection, and the borrow keeps
//! them from outliving it.
//!
//! - [`Repository`]: base type with begin/commit/cancel and statement helpers
//! - [`results`]: result normalization policies applied to every statement
//! - [`RepositoryProvider`]: builds a fresh repository per request

mod base;
mod error;
mod provider;
pub mod results;

pub use base::{Base, FromConnection, Repository, RepositoryKind};
pub use error::{RepositoryError, RepositoryResult};
pub use provider::RepositoryProvider;
pub use results::{handle_results, Normalize, Raw, Serialized};
