//! Leave request validation and status transitions.

use chrono::NaiveDate;

use crate::error::CoreError;

pub const LEAVE_STATUS_PENDING: &str = "Pending";
pub const LEAVE_STATUS_GRANTED: &str = "Granted";
pub const LEAVE_STATUS_DENIED: &str = "Denied";

/// All valid leave status values.
pub const VALID_LEAVE_STATUSES: &[&str] = &[
    LEAVE_STATUS_PENDING,
    LEAVE_STATUS_GRANTED,
    LEAVE_STATUS_DENIED,
];

/// Longest leave a student may request in one go, in days.
pub const MAX_LEAVE_DAYS: i64 = 60;

/// Validate the dates of a new leave request.
pub fn validate_dates(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Result<(), CoreError> {
    if start < today {
        return Err(CoreError::Validation(
            "Leave cannot start in the past".into(),
        ));
    }
    if end < start {
        return Err(CoreError::Validation(
            "End date must be on or after the start date".into(),
        ));
    }
    let days = (end - start).num_days() + 1;
    if days > MAX_LEAVE_DAYS {
        return Err(CoreError::Validation(format!(
            "Leave cannot exceed {MAX_LEAVE_DAYS} days"
        )));
    }
    Ok(())
}

/// Normalize a free-text reason; blank reasons are rejected.
pub fn normalize_reason(reason: &str, what: &str) -> Result<String, CoreError> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("{what} is required")));
    }
    Ok(trimmed.to_string())
}

/// Only pending requests can be granted, denied or cancelled.
pub fn ensure_pending(status: &str) -> Result<(), CoreError> {
    if status == LEAVE_STATUS_PENDING {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Leave request has already been processed ({status})"
        )))
    }
}
