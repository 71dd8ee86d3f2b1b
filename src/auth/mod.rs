//! Vendor Authentication
//!
//! - `password`: bcrypt hashing, run off the async executor
//! - `token`: signed session tokens (HS256, 4 day lifetime) and bearer parsing
//! - `audit`: optional login-timestamp sink
//!
//! The HTTP gate that applies these to protected routes lives in
//! `api::middleware`.

pub mod audit;
pub mod password;
pub mod token;

use thiserror::Error;

pub use audit::{AuditError, JsonFileLoginAudit, LoginAudit, TracingLoginAudit};
pub use password::{PasswordHasher, DEFAULT_HASH_COST};
pub use token::{bearer_token, AuthContext, Claims, TokenIssuer, TOKEN_TTL_SECS};

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing authorization header")]
    MissingToken,

    #[error("{0}")]
    InvalidToken(String),

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("token signing failed: {0}")]
    Signing(String),
}
