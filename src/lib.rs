//! Mess Ledger Backend
//!
//! Multi-tenant bookkeeping service for mess and restaurant vendors.
//!
//! ## Services
//!
//! 1. **Vendor Directory** - registration, login and profile updates
//! 2. **Student Ledger** - per-vendor student payment records with derived
//!    pending amounts and next payment dates
//!
//! Every ledger operation runs on behalf of a vendor identified by a bearer
//! token; records owned by other vendors are invisible.

pub mod api;
pub mod auth;
pub mod common;
pub mod services;
pub mod storage;
pub mod types;

// Re-exports: configuration and errors
pub use common::{ApiError, AppConfig, ConfigError, DatabaseTarget, LedgerError, LogFormat};

// Re-exports: auth
pub use auth::{AuthContext, AuthError, PasswordHasher, TokenIssuer};

// Re-exports: services
pub use services::{StudentLedger, VendorDirectory};

// Re-exports: storage
pub use storage::{StorageError, Stores};

// Re-exports: API
pub use api::{create_router, start_server, AppState, SharedAppState};
