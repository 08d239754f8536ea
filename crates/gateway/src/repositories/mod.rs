//! Request-scoped repositories.

mod statement_repository;

pub use statement_repository::{StatementRepository, Statements};
