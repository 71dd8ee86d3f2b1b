//! API Routes Module
//!
//! Contains route handlers organized by domain:
//! - health: Health check endpoint
//! - vendors: Registration, login and profile updates
//! - students: Student ledger CRUD

pub mod health;
pub mod students;
pub mod vendors;

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::common::error::ApiError;

/// Unwrap a JSON body, reporting malformed input as a validation error
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::validation(rejection.body_text()))
}

/// Fallback for unmatched paths when no static directory is configured
pub async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
