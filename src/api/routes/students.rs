//! Student ledger endpoints. All of them sit behind the auth gate.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};

use super::json_body;
use crate::api::server::SharedAppState;
use crate::auth::AuthContext;
use crate::common::error::ApiError;
use crate::types::{MessageResponse, NewStudentRequest, StudentPatch};

/// POST /students, POST /studentsadd
pub async fn add(
    State(state): State<SharedAppState>,
    Extension(ctx): Extension<AuthContext>,
    payload: Result<Json<NewStudentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let student = state.students.add(&ctx, json_body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

/// GET /students
pub async fn list(
    State(state): State<SharedAppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.students.list(&ctx).await?))
}

/// PUT /students/:id
pub async fn update(
    State(state): State<SharedAppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    payload: Result<Json<StudentPatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let student = state
        .students
        .update(&ctx, &id, json_body(payload)?)
        .await?;
    Ok(Json(student))
}

/// DELETE /students/:id
pub async fn delete(
    State(state): State<SharedAppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.students.delete(&ctx, &id).await?;
    Ok(Json(
        MessageResponse::new("Student deleted successfully").with_id(id),
    ))
}
