//! API Server Module
//!
//! Provides the Axum application builder and server startup logic.
//! Consolidates application state and router configuration.

use std::path::Path;
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};

use super::middleware::{request_logging, require_vendor, security_headers};
use super::routes;
use crate::auth::{JsonFileLoginAudit, LoginAudit, PasswordHasher, TokenIssuer, TracingLoginAudit};
use crate::common::config::AppConfig;
use crate::services::{StudentLedger, VendorDirectory};
use crate::storage::Stores;

/// Combined application state for all API endpoints
pub struct AppState {
    /// Registration, login and profile updates
    pub vendors: VendorDirectory,
    /// Student records
    pub students: StudentLedger,
    /// Verifies bearer tokens at the auth gate
    pub tokens: TokenIssuer,
}

/// Shared application state type
pub type SharedAppState = Arc<AppState>;

impl AppState {
    /// Wire services over the given stores
    pub fn new(
        stores: Stores,
        tokens: TokenIssuer,
        hasher: PasswordHasher,
        audit: Arc<dyn LoginAudit>,
    ) -> SharedAppState {
        let vendors = VendorDirectory::new(stores.vendors, hasher, tokens.clone()).with_audit(audit);
        let students = StudentLedger::new(stores.students);

        Arc::new(Self {
            vendors,
            students,
            tokens,
        })
    }

    /// Wire services from configuration
    pub fn from_config(config: &AppConfig, stores: Stores) -> SharedAppState {
        let audit: Arc<dyn LoginAudit> = match &config.login_log {
            Some(path) => Arc::new(JsonFileLoginAudit::new(path.clone())),
            None => Arc::new(TracingLoginAudit),
        };

        Self::new(
            stores,
            TokenIssuer::new(config.jwt_secret.as_bytes()),
            PasswordHasher::new(config.bcrypt_cost),
            audit,
        )
    }
}

/// Create the API router with all endpoints
///
/// With a `static_dir`, unmatched paths are served from it and fall back to
/// its `index.html`; without one they are a 404 JSON error.
pub fn create_router(state: SharedAppState, static_dir: Option<&Path>) -> Router {
    // CORS configuration - allow frontend origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let protected = Router::new()
        .route("/vendor", put(routes::vendors::update_profile))
        .route(
            "/students",
            get(routes::students::list).post(routes::students::add),
        )
        .route("/studentsadd", post(routes::students::add))
        .route(
            "/students/:id",
            put(routes::students::update).delete(routes::students::delete),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_vendor));

    let router = Router::new()
        .route("/health", get(routes::health::health))
        .route("/register", post(routes::vendors::register))
        .route("/login", post(routes::vendors::login))
        .merge(protected);

    let router = match static_dir {
        Some(dir) => router.fallback_service(
            ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html"))),
        ),
        None => router.fallback(routes::not_found),
    };

    router
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_logging))
        .layer(cors)
        .with_state(state)
}

/// Start the API server and run until Ctrl-C
pub async fn start_server(config: &AppConfig, stores: Stores) -> Result<(), std::io::Error> {
    let state = AppState::from_config(config, stores);
    let app = create_router(state, config.static_dir.as_deref());
    let addr = config.listen_addr();

    println!("=== Mess Ledger API ===");
    println!("Listening on http://{}", addr);
    println!();
    println!("Endpoints:");
    println!("  POST   /register       - Register a vendor");
    println!("  POST   /login          - Obtain a session token");
    println!("  PUT    /vendor         - Update vendor profile");
    println!("  POST   /students       - Add a student");
    println!("  GET    /students       - List students");
    println!("  PUT    /students/:id   - Update a student");
    println!("  DELETE /students/:id   - Delete a student");
    println!("  GET    /health         - Health check");
    println!();

    tracing::info!(target: "mess_ledger::api", %addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!(target: "mess_ledger::api", "API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(target: "mess_ledger::api", error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!(target: "mess_ledger::api", "shutdown signal received");
}

// =============================================================================
// Tests
// =============================================================================
