//! Session Tokens
//!
//! Login issues an HS256-signed token carrying the vendor's ID, email and
//! display name. Tokens expire `TOKEN_TTL_SECS` after issuance; there is no
//! refresh, an expired token means logging in again.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::AuthError;
use crate::types::Vendor;

/// Token lifetime: 4 days
pub const TOKEN_TTL_SECS: i64 = 4 * 24 * 60 * 60;

/// Claims embedded in a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Vendor ID
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Issued at, unix seconds
    pub iat: i64,
    /// Expiry, unix seconds
    pub exp: i64,
}

/// Authenticated caller, attached to a request by the auth gate and passed
/// explicitly to every protected operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub vendor_id: String,
    pub email: String,
    pub name: Option<String>,
}

impl From<Claims> for AuthContext {
    fn from(claims: Claims) -> Self {
        Self {
            vendor_id: claims.id,
            email: claims.email,
            name: claims.name,
        }
    }
}

/// Issues and verifies session tokens with a server-held secret
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenIssuer {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Issue a token for `vendor`, valid from now
    pub fn issue(&self, vendor: &Vendor) -> Result<String, AuthError> {
        self.issue_at(vendor, chrono::Utc::now().timestamp())
    }

    /// Issue a token as if it were created at `issued_at` (unix seconds)
    pub fn issue_at(&self, vendor: &Vendor, issued_at: i64) -> Result<String, AuthError> {
        let claims = Claims {
            id: vendor.id.clone(),
            email: vendor.email.clone(),
            name: Some(vendor.name.clone()),
            iat: issued_at,
            exp: issued_at + TOKEN_TTL_SECS,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Verify signature and expiry, returning the embedded claims
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.ok_or(AuthError::MissingToken)?;

    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or_else(|| AuthError::InvalidToken("malformed authorization header".to_string()))?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidToken(format!(
            "unsupported authorization scheme: {}",
            scheme
        )));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidToken("empty bearer token".to_string()));
    }

    Ok(token)
}
