//! Vendor Directory Service
//!
//! Registration, credential checks and profile updates for vendor accounts.

use std::sync::Arc;

use tokio::sync::OnceCell;

use super::{has_text, require_all};
use crate::auth::{AuthContext, LoginAudit, PasswordHasher, TokenIssuer, TracingLoginAudit};
use crate::common::error::ApiError;
use crate::common::logging::log_auth_event;
use crate::storage::VendorStore;
use crate::types::{
    now_secs, LoginRequest, LoginResponse, RegisterRequest, UpdateVendorRequest, Vendor,
    VendorProfile,
};

/// Vendor account operations
#[derive(Clone)]
pub struct VendorDirectory {
    vendors: Arc<dyn VendorStore>,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
    audit: Arc<dyn LoginAudit>,
    /// Hash verified against when the email is unknown, so both failure
    /// paths pay for one bcrypt check
    dummy_hash: Arc<OnceCell<String>>,
}

impl VendorDirectory {
    pub fn new(vendors: Arc<dyn VendorStore>, hasher: PasswordHasher, tokens: TokenIssuer) -> Self {
        Self {
            vendors,
            hasher,
            tokens,
            audit: Arc::new(TracingLoginAudit),
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Replace the login audit sink
    pub fn with_audit(mut self, audit: Arc<dyn LoginAudit>) -> Self {
        self.audit = audit;
        self
    }

    /// Create a vendor account. No token is issued here.
    pub async fn register(&self, req: RegisterRequest) -> Result<VendorProfile, ApiError> {
        require_all(&[
            ("name", has_text(&req.name)),
            ("email", has_text(&req.email)),
            ("password", has_text(&req.password)),
        ])?;

        let (Some(name), Some(email), Some(password)) = (req.name, req.email, req.password) else {
            return Err(ApiError::validation("Missing required fields"));
        };

        if self.vendors.get_by_email(&email).await?.is_some() {
            log_auth_event(
                "register",
                false,
                serde_json::json!({ "email": email, "reason": "duplicate_email" }),
                None,
            );
            return Err(ApiError::conflict("Vendor with this email already exists"));
        }

        let password_hash = self.hasher.hash(&password).await?;
        let restaurant = req.restaurant.filter(|r| !r.trim().is_empty());
        let vendor = Vendor::new(name, restaurant, email, password_hash);

        // A concurrent registration can still win the race on the unique email
        self.vendors.insert(&vendor).await.map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => ApiError::conflict("Vendor with this email already exists"),
            other => other,
        })?;

        log_auth_event(
            "register",
            true,
            serde_json::json!({ "vendor_id": vendor.id, "email": vendor.email }),
            None,
        );

        Ok(VendorProfile::from(&vendor))
    }

    /// Check credentials and issue a session token.
    ///
    /// An unknown email and a wrong password fail identically.
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, ApiError> {
        require_all(&[
            ("email", has_text(&req.email)),
            ("password", has_text(&req.password)),
        ])?;

        let (Some(email), Some(password)) = (req.email, req.password) else {
            return Err(ApiError::validation("Missing required fields"));
        };

        let Some(vendor) = self.vendors.get_by_email(&email).await? else {
            let dummy = self.dummy_hash().await?;
            self.hasher.verify(&password, dummy).await?;

            log_auth_event(
                "login",
                false,
                serde_json::json!({ "email": email, "reason": "unknown_email" }),
                None,
            );
            return Err(ApiError::Unauthorized);
        };

        if !self.hasher.verify(&password, &vendor.password_hash).await? {
            log_auth_event(
                "login",
                false,
                serde_json::json!({ "email": email, "reason": "bad_password" }),
                None,
            );
            return Err(ApiError::Unauthorized);
        }

        let token = self.tokens.issue(&vendor)?;

        if let Err(e) = self.audit.record_login(&vendor.email, chrono::Utc::now()).await {
            tracing::warn!(
                target: "mess_ledger::auth",
                error = %e,
                "failed to record login timestamp"
            );
        }

        log_auth_event(
            "login",
            true,
            serde_json::json!({ "vendor_id": vendor.id, "email": vendor.email }),
            None,
        );

        Ok(LoginResponse { token })
    }

    async fn dummy_hash(&self) -> Result<&str, ApiError> {
        let hash = self
            .dummy_hash
            .get_or_try_init(|| self.hasher.hash("mess-ledger-unknown-vendor"))
            .await?;
        Ok(hash.as_str())
    }

    /// Apply the supplied profile fields; blank or absent fields are left as they are.
    pub async fn update_profile(
        &self,
        ctx: &AuthContext,
        req: UpdateVendorRequest,
    ) -> Result<VendorProfile, ApiError> {
        let mut vendor = self
            .vendors
            .get_by_id(&ctx.vendor_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Vendor not found"))?;

        if let Some(name) = req.name.filter(|v| !v.trim().is_empty()) {
            vendor.name = name;
        }

        if let Some(restaurant) = req.restaurant.filter(|v| !v.trim().is_empty()) {
            vendor.restaurant = Some(restaurant);
        }

        if let Some(email) = req.email.filter(|v| !v.trim().is_empty()) {
            if email != vendor.email {
                if let Some(owner) = self.vendors.get_by_email(&email).await? {
                    if owner.id != vendor.id {
                        return Err(ApiError::conflict("Email is already in use"));
                    }
                }
                vendor.email = email;
            }
        }

        if let Some(password) = req.password.filter(|v| !v.trim().is_empty()) {
            vendor.password_hash = self.hasher.hash(&password).await?;
        }

        vendor.updated_at = now_secs();
        self.vendors.update(&vendor).await?;

        log_auth_event(
            "profile_update",
            true,
            serde_json::json!({ "vendor_id": vendor.id }),
            None,
        );

        Ok(VendorProfile::from(&vendor))
    }
}
