//! Vendor Account Types

use serde::{Deserialize, Serialize};

/// A vendor account as stored. Not serializable on purpose: API responses
/// go through [`VendorProfile`], which has no password hash.
#[derive(Clone, PartialEq)]
pub struct Vendor {
    pub id: String,
    /// Display name
    pub name: String,
    /// Restaurant or business name
    pub restaurant: Option<String>,
    /// Unique, case-sensitive
    pub email: String,
    /// bcrypt hash
    pub password_hash: String,
    /// Unix seconds
    pub created_at: i64,
    /// Unix seconds
    pub updated_at: i64,
}

impl Vendor {
    pub fn new(
        name: String,
        restaurant: Option<String>,
        email: String,
        password_hash: String,
    ) -> Self {
        let now = super::now_secs();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            restaurant,
            email,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}

impl std::fmt::Debug for Vendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vendor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("restaurant", &self.restaurant)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// Public view of a vendor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorProfile {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurant: Option<String>,
    pub email: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<&Vendor> for VendorProfile {
    fn from(vendor: &Vendor) -> Self {
        Self {
            id: vendor.id.clone(),
            name: vendor.name.clone(),
            restaurant: vendor.restaurant.clone(),
            email: vendor.email.clone(),
            created_at: vendor.created_at,
            updated_at: vendor.updated_at,
        }
    }
}

/// POST /register body. `vendorname` is accepted for `name`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default, alias = "vendorname")]
    pub name: Option<String>,
    #[serde(default)]
    pub restaurant: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// POST /login body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Successful login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// PUT /vendor body. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateVendorRequest {
    #[serde(default, alias = "vendorname")]
    pub name: Option<String>,
    #[serde(default)]
    pub restaurant: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}
