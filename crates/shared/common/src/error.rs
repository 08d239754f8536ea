//! Unified error handling for HTTP services.
//!
//! Provides a single error type that converts into an Axum HTTP response
//! with a stable `{"error": {"code", "message"}}` body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    // Validation
    #[error("{0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    BadRequest(String),

    // Resource errors
    #[error("Resource not found")]
    NotFound,

    // Database errors
    #[cfg(feature = "database")]
    #[error("Database connection error")]
    Driver(#[from] driver::DriverError),

    #[cfg(feature = "database")]
    #[error("Database error")]
    Repository(#[from] repository::RepositoryError),

    #[error("Service unavailable")]
    ServiceUnavailable(String),

    // Internal
    #[error("Internal server error")]
    Internal(String),
}

/// Error response body for HTTP
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

impl AppError {
    /// Get error code for client
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::NotFound => "NOT_FOUND",
            #[cfg(feature = "database")]
            AppError::Driver(_) => "DATABASE_UNAVAILABLE",
            #[cfg(feature = "database")]
            AppError::Repository(repository::RepositoryError::Statement { .. }) => "STATEMENT_FAILED",
            #[cfg(feature = "database")]
            AppError::Repository(_) => "DATABASE_ERROR",
            AppError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            #[cfg(feature = "database")]
            AppError::Driver(_) => StatusCode::SERVICE_UNAVAILABLE,
            #[cfg(feature = "database")]
            AppError::Repository(repository::RepositoryError::Statement { .. }) => {
                StatusCode::BAD_REQUEST
            }
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get user-facing message (hides internal details)
    pub fn user_message(&self) -> String {
        match self {
            // Show full message for client errors
            AppError::Validation(msg) => msg.clone(),
            AppError::BadRequest(msg) => msg.clone(),

            // Statement failures are the caller's own input
            #[cfg(feature = "database")]
            AppError::Repository(e @ repository::RepositoryError::Statement { .. }) => e.to_string(),

            // Hide details for internal/infrastructure errors
            #[cfg(feature = "database")]
            AppError::Driver(e) => {
                tracing::error!("Database connection error: {:?}", e);
                "The database is unavailable".to_string()
            }
            #[cfg(feature = "database")]
            AppError::Repository(e) => {
                tracing::error!("Database error: {:?}", e);
                "A database error occurred".to_string()
            }
            AppError::ServiceUnavailable(service) => {
                tracing::error!("Service unavailable: {}", service);
                format!("Service {} is unavailable", service)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }

            // Use default message for others
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code().to_string(),
                message: self.user_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Convenience constructors
impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    pub fn service_unavailable(service: impl Into<String>) -> Self {
        AppError::ServiceUnavailable(service.into())
    }
}
