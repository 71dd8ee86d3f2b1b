//! API Middleware - Auth Gate, Request Logging and Security Headers
//!
//! - `require_vendor` verifies the bearer token on protected routes and
//!   attaches the caller's `AuthContext` to the request
//! - `request_logging` assigns a correlation ID and logs each request/response
//! - `security_headers` adds standard hardening headers

use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};

use super::server::SharedAppState;
use crate::auth::{bearer_token, AuthContext, AuthError};
use crate::common::error::ApiError;
use crate::common::logging::{
    generate_correlation_id, log_api_request, log_api_response, log_auth_rejection,
};

/// Response header carrying the request's correlation ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation ID for the current request, set by `request_logging`
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

// ============================================================================
// Auth Gate
// ============================================================================

/// Reject requests without a valid bearer token.
///
/// No `Authorization` header is `Unauthenticated` (401); a header that is
/// malformed, badly signed or expired is `Forbidden` (403).
pub async fn require_vendor(
    State(state): State<SharedAppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let correlation_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone());

    let verified = match request.headers().get(header::AUTHORIZATION) {
        None => Err(AuthError::MissingToken),
        Some(value) => value
            .to_str()
            .map_err(|_| AuthError::InvalidToken("authorization header is not valid text".into()))
            .and_then(|raw| bearer_token(Some(raw)))
            .and_then(|token| state.tokens.verify(token)),
    };

    match verified {
        Ok(claims) => {
            request.extensions_mut().insert(AuthContext::from(claims));
            Ok(next.run(request).await)
        }
        Err(e) => {
            let reason = e.to_string();
            let error = ApiError::from(e);
            log_auth_rejection(
                "token_rejected",
                error.error_code(),
                &reason,
                serde_json::json!({ "path": request.uri().path() }),
                correlation_id.as_deref(),
            );
            Err(error)
        }
    }
}

// ============================================================================
// Request Logging
// ============================================================================

/// Log every request and its outcome under a fresh correlation ID, which is
/// echoed back in the `x-request-id` header
pub async fn request_logging(mut request: Request, next: Next) -> Response {
    let correlation_id = generate_correlation_id();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    request
        .extensions_mut()
        .insert(RequestId(correlation_id.clone()));
    log_api_request(&method, &path, &correlation_id);

    let started = Instant::now();
    let mut response = next.run(request).await;
    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    log_api_response(
        &method,
        &path,
        response.status().as_u16(),
        duration_ms,
        &correlation_id,
    );

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

// ============================================================================
// Security Headers
// ============================================================================

/// Security headers middleware
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("no-referrer"),
    );

    response
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::server::AppState;
    use crate::auth::{PasswordHasher, TokenIssuer, TracingLoginAudit};
    use crate::storage::Stores;
    use crate::types::Vendor;
    use axum::{
        body::{to_bytes, Body},
        http::StatusCode,
        middleware,
        routing::get,
        Extension, Router,
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    const SECRET: &[u8] = b"middleware-test-secret";

    async fn whoami(Extension(ctx): Extension<AuthContext>) -> String {
        ctx.vendor_id
    }

    fn app() -> Router {
        let state = AppState::new(
            Stores::in_memory(),
            TokenIssuer::new(SECRET),
            PasswordHasher::new(4),
            Arc::new(TracingLoginAudit),
        );

        Router::new()
            .route("/whoami", get(whoami))
            .route_layer(middleware::from_fn_with_state(state.clone(), require_vendor))
            .layer(middleware::from_fn(request_logging))
            .with_state(state)
    }

    fn vendor() -> Vendor {
        Vendor::new("Ravi".into(), None, "ravi@example.com".into(), "hash".into())
    }

    async fn call(auth: Option<&str>) -> Response {
        let mut builder = axum::http::Request::builder().uri("/whoami");
        if let Some(value) = auth {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        app().oneshot(builder.body(Body::empty()).unwrap()).await.unwrap()
    }

    async fn error_code(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        body["code"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_valid_token_passes_context() {
        let v = vendor();
        let token = TokenIssuer::new(SECRET).issue(&v).unwrap();

        let response = call(Some(&format!("Bearer {}", token))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], v.id.as_bytes());
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthenticated() {
        let response = call(None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        assert_eq!(error_code(response).await, "UNAUTHENTICATED");
    }

    #[tokio::test]
    async fn test_bad_tokens_are_forbidden() {
        let foreign = TokenIssuer::new(b"some-other-secret-value")
            .issue(&vendor())
            .unwrap();
        let expired = TokenIssuer::new(SECRET)
            .issue_at(&vendor(), chrono::Utc::now().timestamp() - 5 * 24 * 60 * 60)
            .unwrap();

        for auth in [
            "Bearer not-a-token".to_string(),
            "Basic dXNlcjpwdw==".to_string(),
            format!("Bearer {}", foreign),
            format!("Bearer {}", expired),
        ] {
            let response = call(Some(&auth)).await;
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "{}", auth);
            assert_eq!(error_code(response).await, "FORBIDDEN");
        }
    }

    #[tokio::test]
    async fn test_security_headers_added() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(middleware::from_fn(security_headers));

        let response = app
            .oneshot(axum::http::Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(response.headers()[header::X_FRAME_OPTIONS], "DENY");
    }
}
