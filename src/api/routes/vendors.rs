//! Vendor account endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};

use super::json_body;
use crate::api::server::SharedAppState;
use crate::auth::AuthContext;
use crate::common::error::ApiError;
use crate::types::{LoginRequest, MessageResponse, RegisterRequest, UpdateVendorRequest};

/// POST /register
///
/// Create a vendor account. Returns an acknowledgment with the new ID;
/// the client logs in separately to obtain a token.
pub async fn register(
    State(state): State<SharedAppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state.vendors.register(json_body(payload)?).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Vendor registered successfully").with_id(profile.id)),
    ))
}

/// POST /login
pub async fn login(
    State(state): State<SharedAppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.vendors.login(json_body(payload)?).await?;
    Ok(Json(response))
}

/// PUT /vendor
///
/// Update the caller's own profile and return it without the password hash.
pub async fn update_profile(
    State(state): State<SharedAppState>,
    Extension(ctx): Extension<AuthContext>,
    payload: Result<Json<UpdateVendorRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state
        .vendors
        .update_profile(&ctx, json_body(payload)?)
        .await?;
    Ok(Json(profile))
}
