//! Health check handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: ServiceHealth,
}

/// Service health with optional error message.
#[derive(Debug, Serialize)]
pub struct ServiceHealth {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Create health routes.
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}

/// Health check endpoint - opens and closes one database session.
pub async fn health_check(State(state): State<AppState>) -> Response {
    let database = match state.statements.drivers().acquire().await {
        Ok(mut driver) => {
            if let Err(e) = driver.release().await {
                tracing::warn!("Health check session did not close cleanly: {}", e);
            }
            ServiceHealth {
                status: "healthy".to_string(),
                error: None,
            }
        }
        Err(e) => {
            tracing::error!("Health check could not open a database session: {:?}", e);
            ServiceHealth {
                status: "unhealthy".to_string(),
                error: Some("The database is unavailable".to_string()),
            }
        }
    };

    let healthy = database.error.is_none();

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        database,
    };

    if healthy {
        (StatusCode::OK, Json(response)).into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response)).into_response()
    }
}
