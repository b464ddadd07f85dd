//! Error handling module for the annotation backend.
//!
//! Provides centralized error types with mapping to HTTP status codes and response envelopes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const CONFLICT: &str = "CONFLICT";
    pub const POLICY_VIOLATION: &str = "POLICY_VIOLATION";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
}

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed input
    #[error("{0}")]
    Validation(String),
    /// No valid session
    #[error("{0}")]
    Unauthenticated(String),
    /// Authenticated, but not allowed to do this
    #[error("{0}")]
    Forbidden(String),
    /// Unique name/email/membership already taken
    #[error("{0}")]
    Conflict(String),
    /// Unknown user, team or entry
    #[error("{0}")]
    NotFound(String),
    /// Rejected by a content policy (e.g. banned identifier)
    #[error("{0}")]
    Policy(String),
    /// Database error
    #[error("{0}")]
    Database(String),
    /// Internal server error
    #[error("{0}")]
    Internal(String),
    /// Bad request
    #[error("{0}")]
    BadRequest(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Policy(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::Unauthenticated(_) => codes::UNAUTHENTICATED,
            AppError::Forbidden(_) => codes::FORBIDDEN,
            AppError::Conflict(_) => codes::CONFLICT,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::Policy(_) => codes::POLICY_VIOLATION,
            AppError::Database(_) => codes::DATABASE_ERROR,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
            AppError::BadRequest(_) => codes::BAD_REQUEST,
        }
    }

    /// Shorthand for a missing request parameter.
    pub fn missing(field: &str) -> Self {
        AppError::Validation(format!("Missing parameter: {}", field))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::RowNotFound = err {
            return AppError::NotFound("Record not found".to_string());
        }
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                return AppError::Conflict("Record already exists".to_string());
            }
        }
        tracing::error!("Database error: {:?}", err);
        AppError::Database(format!("Database error: {}", err))
    }
}

impl From<password_hash::Error> for AppError {
    fn from(err: password_hash::Error) -> Self {
        tracing::error!("Hashing error: {:?}", err);
        AppError::Internal(format!("Hashing error: {}", err))
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub error: ErrorDetails,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        Self {
            status: "error".to_string(),
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::new(&self);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_distinguish_not_found_from_forbidden() {
        let not_found = AppError::NotFound("Entry 7 not found".into());
        let forbidden = AppError::Forbidden("You need to be the author".into());

        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_ne!(not_found.error_code(), forbidden.error_code());
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_error_envelope() {
        let body = ErrorResponse::new(&AppError::missing("title"));
        assert_eq!(body.status, "error");
        assert_eq!(body.error.code, codes::VALIDATION_ERROR);
        assert_eq!(body.error.message, "Missing parameter: title");
    }
}
