//! Validated JSON extractor.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use common::AppError;

/// JSON extractor that rejects malformed or invalid payloads with a 400.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        value
            .validate()
            .map_err(|e| AppError::validation(first_message(&e)))?;

        Ok(ValidatedJson(value))
    }
}

/// `field: message` for the first failing field.
fn first_message(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .into_iter()
        .find_map(|(field, errors)| {
            errors.first().map(|error| match &error.message {
                Some(message) => format!("{}: {}", field, message),
                None => format!("{}: invalid value", field),
            })
        })
        .unwrap_or_else(|| "Validation failed".to_string())
}
