//! Result normalization.
//!
//! Every repository statement goes through [`handle_results`], which runs the
//! statement and applies a [`Normalize`] policy to the response:
//! - [`Raw`] hands back the session's response untouched
//! - [`Serialized`] fails on the first errored statement and otherwise
//!   yields the result values in order

use driver::{QueryResponse, Session, Status};
use serde_json::Value;

use crate::error::{RepositoryError, RepositoryResult};

/// Policy turning a raw response into a repository result.
pub trait Normalize {
    type Output: Send;

    fn normalize(response: QueryResponse) -> RepositoryResult<Self::Output>;
}

/// Pass-through policy.
#[derive(Debug, Clone, Copy)]
pub struct Raw;

impl Normalize for Raw {
    type Output = QueryResponse;

    fn normalize(response: QueryResponse) -> RepositoryResult<Self::Output> {
        Ok(response)
    }
}

/// Status-checking policy yielding one value per statement.
#[derive(Debug, Clone, Copy)]
pub struct Serialized;

impl Normalize for Serialized {
    type Output = Vec<Value>;

    fn normalize(response: QueryResponse) -> RepositoryResult<Self::Output> {
        response
            .into_statements()
            .into_iter()
            .enumerate()
            .map(|(index, statement)| match statement.status {
                Status::Ok => Ok(statement.result),
                Status::Err => Err(RepositoryError::Statement {
                    index,
                    message: error_message(&statement.result),
                }),
            })
            .collect()
    }
}

fn error_message(value: &Value) -> String {
    match value {
        Value::String(message) => message.clone(),
        other => other.to_string(),
    }
}

/// Execute `statement` on `db` and normalize the response with `N`.
///
/// Session failures pass through as [`RepositoryError::Session`].
pub async fn handle_results<N, S>(db: &S, statement: &str) -> RepositoryResult<N::Output>
where
    N: Normalize,
    S: Session + ?Sized,
{
    tracing::debug!(statement, "Running statement");
    let response = db.query(statement).await?;
    N::normalize(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use driver::{MockSession, SessionError, StatementResult};
    use serde_json::json;

    fn mixed_response() -> QueryResponse {
        QueryResponse::new(vec![
            StatementResult::ok(json!([{ "id": "person:1" }])),
            StatementResult::err("Table 'missing' does not exist"),
            StatementResult::ok(Value::Null),
        ])
    }

    #[test]
    fn test_raw_passes_errors_through() {
        let response = Raw::normalize(mixed_response()).unwrap();
        assert_eq!(response, mixed_response());
    }

    #[test]
    fn test_serialized_collects_values() {
        let response = QueryResponse::new(vec![
            StatementResult::ok(json!([{ "id": "person:1" }])),
            StatementResult::ok(Value::Null),
        ]);

        let values = Serialized::normalize(response).unwrap();
        assert_eq!(values, vec![json!([{ "id": "person:1" }]), Value::Null]);
    }

    #[test]
    fn test_serialized_reports_first_error() {
        let result = Serialized::normalize(mixed_response());

        match result {
            Err(RepositoryError::Statement { index, message }) => {
                assert_eq!(index, 1);
                assert_eq!(message, "Table 'missing' does not exist");
            }
            other => panic!("expected statement error, got {:?}", other),
        }
    }

    #[test]
    fn test_serialized_non_string_error_is_rendered() {
        let response = QueryResponse::new(vec![StatementResult {
            status: Status::Err,
            time: String::new(),
            result: json!({ "code": 42 }),
        }]);

        match Serialized::normalize(response) {
            Err(RepositoryError::Statement { message, .. }) => {
                assert_eq!(message, r#"{"code":42}"#);
            }
            other => panic!("expected statement error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_handle_results_propagates_session_error() {
        let mut session = MockSession::new();
        session
            .expect_query()
            .times(1)
            .returning(|_| Err(SessionError::NotConnected));

        let result = handle_results::<Raw, _>(&session, "SELECT 1").await;
        assert!(matches!(
            result,
            Err(RepositoryError::Session(SessionError::NotConnected))
        ));
    }
}
