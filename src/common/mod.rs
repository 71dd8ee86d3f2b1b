//! Common Infrastructure Module
//!
//! Shared utilities and configuration for the mess ledger backend.
//!
//! This module contains:
//! - Configuration loading from environment variables
//! - Structured logging setup
//! - Common error types

pub mod config;
pub mod error;
pub mod logging;

// Re-exports for convenience
pub use config::{AppConfig, ConfigError, DatabaseTarget, LogFormat};
pub use error::{ApiError, ErrorResponse, LedgerError, Result};
pub use logging::{
    auth_rejection_event, generate_correlation_id, init_from_config, init_logging,
    log_api_request, log_api_response, log_auth_event, log_auth_rejection, log_ledger_event,
    ErrorDetails, EventCategory, LogEvent, LogLevel, LoggingError,
};
