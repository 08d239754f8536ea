//! HTTP handlers.

mod health_handler;
mod statement_handler;

pub use health_handler::{health_check, health_routes, HealthResponse, ServiceHealth};
pub use statement_handler::{
    execute_statements, statement_routes, StatementsRequest, StatementsResponse,
};
