//! Shared Domain Types
//!
//! Vendor accounts and student payment records, plus the request and
//! response bodies the HTTP layer exchanges for them.

pub mod student;
pub mod vendor;

pub use student::{
    next_payment_date, parse_calendar_date, pending_amount, NewStudentRequest, Student,
    StudentPatch,
};
pub use vendor::{
    LoginRequest, LoginResponse, RegisterRequest, UpdateVendorRequest, Vendor, VendorProfile,
};

use serde::{Deserialize, Deserializer, Serialize};

/// Plain acknowledgment body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Current time as unix seconds
pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Deserialize a text field that clients sometimes send as a JSON number
pub(crate) fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_json::Value;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!("expected text, got {}", other))),
    }
}

/// Deserialize an amount sent either as a JSON number or a numeric string
pub(crate) fn amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_json::Value;

    let value = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| D::Error::custom("amount out of range"))?,
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("invalid amount: {:?}", s)))?,
        Some(other) => return Err(D::Error::custom(format!("expected amount, got {}", other))),
    };

    if !value.is_finite() {
        return Err(D::Error::custom("amount must be finite"));
    }

    Ok(Some(value))
}
