//! Fee status rules.
//!
//! Only `Pending` and `Paid` are stored. `Overdue` is reported for pending
//! fees whose due date has passed, so it never goes stale in the database.

use chrono::NaiveDate;

use crate::error::CoreError;
use crate::types::DbId;

pub const FEE_STATUS_PENDING: &str = "Pending";
pub const FEE_STATUS_PAID: &str = "Paid";
pub const FEE_STATUS_OVERDUE: &str = "Overdue";

/// Values accepted for the stored `status` column.
pub const STORED_FEE_STATUSES: &[&str] = &[FEE_STATUS_PENDING, FEE_STATUS_PAID];

/// Title prefix of the notification created for a newly assigned fee.
pub const NEW_FEE_TITLE_PREFIX: &str = "New Fee: ";

/// Status shown to clients for a fee.
pub fn effective_status(stored: &str, due_date: Option<NaiveDate>, today: NaiveDate) -> &str {
    match due_date {
        Some(due) if stored == FEE_STATUS_PENDING && due < today => FEE_STATUS_OVERDUE,
        _ => stored,
    }
}

/// Validate a fee amount (positive and finite).
pub fn validate_amount(amount: f64) -> Result<(), CoreError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(CoreError::Validation(
            "Fee amount must be a positive number".into(),
        ));
    }
    Ok(())
}

/// Check that `student_id` may pay the fee described by `owner_id`/`status`.
pub fn ensure_payable(
    fee_id: DbId,
    owner_id: DbId,
    status: &str,
    student_id: DbId,
) -> Result<(), CoreError> {
    if owner_id != student_id {
        return Err(CoreError::Forbidden(
            "You can only pay your own fees".into(),
        ));
    }
    if status == FEE_STATUS_PAID {
        return Err(CoreError::Conflict(format!("Fee {fee_id} is already paid")));
    }
    Ok(())
}

/// Title of the notification sent with a newly assigned fee.
pub fn new_fee_title(description: &str) -> String {
    format!("{NEW_FEE_TITLE_PREFIX}{description}")
}

/// Body of the notification sent with a newly assigned fee.
pub fn new_fee_content(description: &str, amount: f64, due_date: Option<NaiveDate>) -> String {
    match due_date {
        Some(due) => format!(
            "A new fee '{description}' of {amount:.2} has been assigned. Due date: {}.",
            due.format("%Y-%m-%d")
        ),
        None => format!("A new fee '{description}' of {amount:.2} has been assigned."),
    }
}
