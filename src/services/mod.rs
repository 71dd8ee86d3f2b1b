//! Domain Services Module
//!
//! Contains the business logic behind the HTTP routes:
//! - Vendor directory: registration, login, profile updates
//! - Student ledger: per-vendor student payment records
//!
//! Services receive their stores and secrets at construction and the
//! caller's `AuthContext` as an argument on every protected operation.

pub mod students;
pub mod vendors;

pub use students::StudentLedger;
pub use vendors::VendorDirectory;

use crate::common::error::ApiError;

/// Names of required fields that are absent or blank
fn missing_fields(fields: &[(&'static str, bool)]) -> Vec<&'static str> {
    fields
        .iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| *name)
        .collect()
}

/// Fail with a validation error listing every missing field
fn require_all(fields: &[(&'static str, bool)]) -> Result<(), ApiError> {
    let missing = missing_fields(fields);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )))
    }
}

/// Present and not just whitespace
fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_all_lists_missing() {
        assert!(require_all(&[("name", true), ("email", true)]).is_ok());

        let err = require_all(&[("name", false), ("email", true), ("password", false)])
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields: name, password");
    }

    #[test]
    fn test_has_text() {
        assert!(has_text(&Some("x".into())));
        assert!(!has_text(&Some("   ".into())));
        assert!(!has_text(&None));
    }
}
