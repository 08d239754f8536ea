//! Statement execution handlers.

use axum::{extract::State, response::Json, routing::post, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use common::{AppError, AppResult};

use crate::extractors::ValidatedJson;
use crate::state::AppState;

/// Batch of statements to run atomically.
#[derive(Debug, Deserialize, Validate)]
pub struct StatementsRequest {
    #[validate(length(min = 1, message = "At least one statement is required"))]
    pub statements: Vec<String>,
}

/// One value per executed statement, in request order.
#[derive(Debug, Serialize)]
pub struct StatementsResponse {
    pub results: Vec<Value>,
}

/// Create statement routes
pub fn statement_routes() -> Router<AppState> {
    Router::new().route("/", post(execute_statements))
}

/// Run the submitted statements in a single transaction
pub async fn execute_statements(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<StatementsRequest>,
) -> AppResult<Json<StatementsResponse>> {
    let statements = request.statements;
    tracing::debug!(count = statements.len(), "Executing statement batch");

    let results = state
        .statements
        .scope(|repo| {
            Box::pin(async move { Ok::<_, AppError>(repo.run_atomic(&statements).await?) })
        })
        .await?;

    Ok(Json(StatementsResponse { results }))
}
