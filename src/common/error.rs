//! Common Error Types for the Mess Ledger Backend
//!
//! `ApiError` is the request-level taxonomy every handler reports through;
//! `LedgerError` covers process startup.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;
use crate::storage::StorageError;

/// Message returned for every login failure, whichever check failed.
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Request-level errors surfaced to API clients
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed required input
    #[error("{0}")]
    Validation(String),

    /// No bearer token supplied
    #[error("authentication required")]
    Unauthenticated,

    /// Bearer token present but invalid or expired
    #[error("{0}")]
    Forbidden(String),

    /// Bad credentials at login
    #[error("Invalid email or password")]
    Unauthorized,

    /// Duplicate unique key
    #[error("{0}")]
    Conflict(String),

    /// Resource absent, or not owned by the caller
    #[error("{0}")]
    NotFound(String),

    /// Unexpected store or hash failure; the detail is logged, never returned
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not-found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated | ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Unauthenticated => "UNAUTHENTICATED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show to the client
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

/// Error body returned for every failed request
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            tracing::error!(target: "mess_ledger::api", error = %detail, "request failed");
        }

        let body = ErrorResponse {
            error: self.public_message(),
            code: self.error_code(),
        };

        (self.status(), Json(body)).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Duplicate(what) => ApiError::Conflict(format!("{} already exists", what)),
            StorageError::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken => ApiError::Unauthenticated,
            AuthError::InvalidToken(reason) => {
                ApiError::Forbidden(format!("Invalid or expired token: {}", reason))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Root error type for process startup
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),

    /// Logging errors
    #[error("logging error: {0}")]
    Logging(#[from] super::logging::LoggingError),

    /// Storage errors
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using LedgerError
pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::validation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::conflict("x").status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_detail_hidden() {
        let err = ApiError::Internal("disk I/O error at /var/db".into());
        assert_eq!(err.public_message(), "Internal server error");
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_storage_conversion() {
        let conflict: ApiError = StorageError::Duplicate("email".to_string()).into();
        assert!(matches!(conflict, ApiError::Conflict(_)));

        let missing: ApiError = StorageError::NotFound("student".to_string()).into();
        assert!(matches!(missing, ApiError::NotFound(_)));

        let db: ApiError = StorageError::Database("locked".to_string()).into();
        assert!(matches!(db, ApiError::Internal(_)));
    }

    #[test]
    fn test_auth_conversion() {
        assert!(matches!(
            ApiError::from(AuthError::MissingToken),
            ApiError::Unauthenticated
        ));
        assert!(matches!(
            ApiError::from(AuthError::InvalidToken("expired".into())),
            ApiError::Forbidden(_)
        ));
        assert!(matches!(
            ApiError::from(AuthError::Hash("boom".into())),
            ApiError::Internal(_)
        ));
    }
}
