//! Student Ledger Service
//!
//! Per-vendor CRUD over student payment records. Every operation is scoped
//! to the calling vendor; a record owned by someone else behaves exactly
//! like a record that does not exist.

use std::sync::Arc;

use chrono::NaiveDate;

use super::{has_text, require_all};
use crate::auth::AuthContext;
use crate::common::error::ApiError;
use crate::common::logging::log_ledger_event;
use crate::storage::StudentStore;
use crate::types::{
    next_payment_date, now_secs, parse_calendar_date, pending_amount, NewStudentRequest, Student,
    StudentPatch,
};

const STUDENT_NOT_FOUND: &str = "Student not found";

/// Student record operations
#[derive(Clone)]
pub struct StudentLedger {
    students: Arc<dyn StudentStore>,
}

impl StudentLedger {
    pub fn new(students: Arc<dyn StudentStore>) -> Self {
        Self { students }
    }

    /// Create a record owned by the caller with derived fields computed
    pub async fn add(&self, ctx: &AuthContext, req: NewStudentRequest) -> Result<Student, ApiError> {
        require_all(&[
            ("name", has_text(&req.name)),
            ("phone", has_text(&req.phone)),
            ("meals", has_text(&req.meals)),
            ("startDate", has_text(&req.start_date)),
            ("endDate", has_text(&req.end_date)),
            ("totalAmount", req.total_amount.is_some()),
            ("paidAmount", req.paid_amount.is_some()),
        ])?;

        let (
            Some(name),
            Some(phone),
            Some(meals),
            Some(start_raw),
            Some(end_raw),
            Some(total_amount),
            Some(paid_amount),
        ) = (
            req.name,
            req.phone,
            req.meals,
            req.start_date,
            req.end_date,
            req.total_amount,
            req.paid_amount,
        )
        else {
            return Err(ApiError::validation("Missing required fields"));
        };

        let start_date = parse_date("startDate", &start_raw)?;
        let end_date = parse_date("endDate", &end_raw)?;
        let now = now_secs();

        let student = Student {
            id: uuid::Uuid::new_v4().to_string(),
            vendor_id: ctx.vendor_id.clone(),
            name,
            phone,
            meals,
            total_amount,
            paid_amount,
            pending_amount: pending_amount(total_amount, paid_amount),
            start_date,
            end_date,
            next_payment_date: advance(end_date)?,
            created_at: now,
            updated_at: now,
        };

        self.students.insert(&student).await?;
        log_ledger_event("student_added", &ctx.vendor_id, &student.id);

        Ok(student)
    }

    /// All records owned by the caller
    pub async fn list(&self, ctx: &AuthContext) -> Result<Vec<Student>, ApiError> {
        Ok(self.students.list_by_vendor(&ctx.vendor_id).await?)
    }

    /// Apply an allow-listed partial update, then refresh derived fields.
    ///
    /// `pendingAmount` is always recomputed from the stored amounts, so a
    /// client-supplied value never survives. `nextPaymentDate` moves only
    /// when `endDate` is part of the patch.
    pub async fn update(
        &self,
        ctx: &AuthContext,
        id: &str,
        patch: StudentPatch,
    ) -> Result<Student, ApiError> {
        let mut student = self
            .students
            .get_owned(&ctx.vendor_id, id)
            .await?
            .ok_or_else(|| ApiError::not_found(STUDENT_NOT_FOUND))?;

        if let Some(name) = patch.name {
            student.name = non_blank("name", name)?;
        }
        if let Some(phone) = patch.phone {
            student.phone = non_blank("phone", phone)?;
        }
        if let Some(meals) = patch.meals {
            student.meals = non_blank("meals", meals)?;
        }
        if let Some(raw) = patch.start_date {
            student.start_date = parse_date("startDate", &raw)?;
        }
        if let Some(total) = patch.total_amount {
            student.total_amount = total;
        }
        if let Some(paid) = patch.paid_amount {
            student.paid_amount = paid;
        }
        if let Some(pending) = patch.pending_amount {
            student.pending_amount = pending;
        }

        // Both amounts are always on record, so the derived value wins
        student.pending_amount = pending_amount(student.total_amount, student.paid_amount);

        if let Some(raw) = patch.end_date {
            let end_date = parse_date("endDate", &raw)?;
            student.end_date = end_date;
            student.next_payment_date = advance(end_date)?;
        }

        student.updated_at = now_secs();

        self.students.update(&student).await.map_err(|e| match ApiError::from(e) {
            ApiError::NotFound(_) => ApiError::not_found(STUDENT_NOT_FOUND),
            other => other,
        })?;
        log_ledger_event("student_updated", &ctx.vendor_id, &student.id);

        Ok(student)
    }

    /// Remove a record owned by the caller
    pub async fn delete(&self, ctx: &AuthContext, id: &str) -> Result<(), ApiError> {
        if !self.students.delete_owned(&ctx.vendor_id, id).await? {
            return Err(ApiError::not_found(STUDENT_NOT_FOUND));
        }

        log_ledger_event("student_deleted", &ctx.vendor_id, id);
        Ok(())
    }
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, ApiError> {
    parse_calendar_date(raw)
        .ok_or_else(|| ApiError::validation(format!("Invalid {}: {}", field, raw)))
}

fn advance(end_date: NaiveDate) -> Result<NaiveDate, ApiError> {
    next_payment_date(end_date)
        .ok_or_else(|| ApiError::validation(format!("endDate out of range: {}", end_date)))
}

fn non_blank(field: &str, value: String) -> Result<String, ApiError> {
    if value.trim().is_empty() {
        Err(ApiError::validation(format!("{} cannot be empty", field)))
    } else {
        Ok(value)
    }
}
