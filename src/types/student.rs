//! Student Ledger Types
//!
//! A student record tracks one meal-plan subscription and its payment state.
//! Two fields are derived and never trusted from input:
//! `pendingAmount = totalAmount - paidAmount` and
//! `nextPaymentDate = endDate + 1 calendar month`.

use chrono::{DateTime, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A student payment record, owned by exactly one vendor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    /// Owning vendor
    pub vendor_id: String,
    pub name: String,
    pub phone: String,
    /// Free-text meal plan descriptor
    pub meals: String,
    pub total_amount: f64,
    pub paid_amount: f64,
    /// `total_amount - paid_amount`; negative means overpaid
    pub pending_amount: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// `end_date` advanced by one calendar month
    pub next_payment_date: NaiveDate,
    /// Unix seconds
    pub created_at: i64,
    /// Unix seconds
    pub updated_at: i64,
}

/// Amount still owed. Not clamped at zero.
pub fn pending_amount(total_amount: f64, paid_amount: f64) -> f64 {
    total_amount - paid_amount
}

/// Advance `end_date` by one calendar month.
///
/// The day of month is kept when the target month has it, otherwise it
/// clamps to the target month's last day (2024-01-31 -> 2024-02-29).
/// Returns `None` only past the end of the representable calendar.
pub fn next_payment_date(end_date: NaiveDate) -> Option<NaiveDate> {
    end_date.checked_add_months(Months::new(1))
}

/// Parse a client-supplied date.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and bare `YYYY-MM-DDTHH:MM:SS`;
/// for timestamps the calendar date as written is used, no timezone shift.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_local().date());
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|ts| ts.date())
}

/// Body of an add-student request. Every field is required; they are
/// optional here so absence is reported as a validation error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudentRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "super::text_or_number")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "super::text_or_number")]
    pub meals: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "super::amount")]
    pub total_amount: Option<f64>,
    #[serde(default, deserialize_with = "super::amount")]
    pub paid_amount: Option<f64>,
}

/// Partial student update. Only these fields can be changed; anything
/// else in the body (id, vendorId, nextPaymentDate, ...) is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "super::text_or_number")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "super::text_or_number")]
    pub meals: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "super::amount")]
    pub total_amount: Option<f64>,
    #[serde(default, deserialize_with = "super::amount")]
    pub paid_amount: Option<f64>,
    #[serde(default, deserialize_with = "super::amount")]
    pub pending_amount: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_pending_amount() {
        assert_eq!(pending_amount(1000.0, 300.0), 700.0);
        assert_eq!(pending_amount(500.0, 500.0), 0.0);
        // Overpayment stays negative
        assert_eq!(pending_amount(500.0, 650.0), -150.0);
    }

    #[test]
    fn test_next_payment_date_keeps_day() {
        assert_eq!(next_payment_date(date("2024-03-15")), Some(date("2024-04-15")));
        assert_eq!(next_payment_date(date("2024-12-20")), Some(date("2025-01-20")));
    }

    #[test]
    fn test_next_payment_date_clamps_month_end() {
        assert_eq!(next_payment_date(date("2024-01-31")), Some(date("2024-02-29")));
        assert_eq!(next_payment_date(date("2023-01-31")), Some(date("2023-02-28")));
        assert_eq!(next_payment_date(date("2024-03-31")), Some(date("2024-04-30")));
        assert_eq!(next_payment_date(date("2024-08-31")), Some(date("2024-09-30")));
    }

    #[test]
    fn test_parse_calendar_date_formats() {
        assert_eq!(parse_calendar_date("2024-01-31"), Some(date("2024-01-31")));
        assert_eq!(
            parse_calendar_date("2024-01-31T00:00:00.000Z"),
            Some(date("2024-01-31"))
        );
        assert_eq!(
            parse_calendar_date("2024-01-31T23:30:00+05:30"),
            Some(date("2024-01-31"))
        );
        assert_eq!(
            parse_calendar_date("2024-01-31T08:00:00"),
            Some(date("2024-01-31"))
        );
        assert_eq!(parse_calendar_date("31/01/2024"), None);
        assert_eq!(parse_calendar_date("2024-02-30"), None);
        assert_eq!(parse_calendar_date(""), None);
    }

    #[test]
    fn test_new_student_request_lenient_inputs() {
        let req: NewStudentRequest = serde_json::from_value(serde_json::json!({
            "name": "Asha",
            "phone": 9876543210u64,
            "meals": "lunch+dinner",
            "startDate": "2024-01-01",
            "endDate": "2024-01-31",
            "totalAmount": "1000",
            "paidAmount": 300
        }))
        .unwrap();

        assert_eq!(req.phone.as_deref(), Some("9876543210"));
        assert_eq!(req.total_amount, Some(1000.0));
        assert_eq!(req.paid_amount, Some(300.0));
    }

    #[test]
    fn test_new_student_request_nulls_are_absent() {
        let req: NewStudentRequest = serde_json::from_value(serde_json::json!({
            "name": "Asha",
            "paidAmount": null
        }))
        .unwrap();

        assert!(req.paid_amount.is_none());
        assert!(req.phone.is_none());
        assert!(req.start_date.is_none());
    }

    #[test]
    fn test_bad_amount_rejected() {
        let result: Result<NewStudentRequest, _> =
            serde_json::from_value(serde_json::json!({ "totalAmount": "lots" }));
        assert!(result.is_err());

        let result: Result<NewStudentRequest, _> =
            serde_json::from_value(serde_json::json!({ "paidAmount": [1, 2] }));
        assert!(result.is_err());
    }

    #[test]
    fn test_patch_ignores_fields_outside_allow_list() {
        let patch: StudentPatch = serde_json::from_value(serde_json::json!({
            "paidAmount": 400,
            "vendorId": "someone-else",
            "nextPaymentDate": "1999-01-01",
            "id": "forged"
        }))
        .unwrap();

        assert_eq!(patch.paid_amount, Some(400.0));
        assert!(patch.name.is_none());
        assert!(patch.end_date.is_none());
    }

    #[test]
    fn test_student_serializes_camel_case() {
        let student = Student {
            id: "s1".into(),
            vendor_id: "v1".into(),
            name: "Asha".into(),
            phone: "123".into(),
            meals: "lunch".into(),
            total_amount: 1000.0,
            paid_amount: 300.0,
            pending_amount: 700.0,
            start_date: date("2024-01-01"),
            end_date: date("2024-01-31"),
            next_payment_date: date("2024-02-29"),
            created_at: 0,
            updated_at: 0,
        };

        let json = serde_json::to_value(&student).unwrap();
        assert_eq!(json["vendorId"], "v1");
        assert_eq!(json["pendingAmount"], 700.0);
        assert_eq!(json["nextPaymentDate"], "2024-02-29");
    }
}
