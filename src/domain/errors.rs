//! Domain error types
//!
//! These errors represent business-level failures. Every variant carries a
//! short message that is safe to expose to the caller; database failures are
//! the exception and are masked at the HTTP boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum DomainError {
    /// Malformed or missing input
    Validation(String),
    /// Bad credentials or unknown identity
    Auth(String),
    /// Authenticated but forbidden
    Authorization(String),
    /// Referenced entity absent
    NotFound(String),
    /// Query intent engine rejection
    Query(String),
    /// Database/persistence error
    Database(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::Validation(msg)
            | DomainError::Auth(msg)
            | DomainError::Authorization(msg)
            | DomainError::NotFound(msg)
            | DomainError::Query(msg) => write!(f, "{}", msg),
            DomainError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        DomainError::Database(e.to_string())
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            DomainError::Validation(msg) | DomainError::Query(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            DomainError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            DomainError::Authorization(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            DomainError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            DomainError::Database(msg) => {
                // Internal detail stays in the log, never in the response body.
                tracing::error!("Unexpected error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred.".to_string(),
                )
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
