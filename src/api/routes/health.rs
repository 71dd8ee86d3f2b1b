use axum::{response::IntoResponse, Json};

/// GET /health
///
/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "mess-ledger",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
