//! Route configuration.

use axum::Router;

use crate::handlers::{health_routes, statement_routes};
use crate::state::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/health", health_routes())
        .nest("/statements", statement_routes())
        .with_state(state)
}
