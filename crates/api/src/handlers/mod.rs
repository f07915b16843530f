//! Request handlers, one submodule per resource.
//!
//! Handlers load state through the `hms_db` repositories, ask `hms_core`
//! what is allowed, persist the result and map errors via [`AppError`].

pub mod attendance;
pub mod auth;
pub mod complaints;
pub mod fee_notifications;
pub mod feedback;
pub mod fees;
pub mod fingerprint;
pub mod leave;
pub mod notices;
pub mod notifications;
pub mod rooms;
pub mod students;
pub mod uploads;
pub mod users;

use chrono::{NaiveDate, Utc};
use hms_core::error::CoreError;
use hms_db::models::student::Student;
use hms_db::repositories::StudentRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Load the student record belonging to the authenticated user.
pub(crate) async fn current_student(state: &AppState, user: &AuthUser) -> AppResult<Student> {
    StudentRepo::find_by_user_id(&state.pool, user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Student record not found".into()))
}

/// The current UTC calendar date.
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Trim a required text field, rejecting blanks.
pub(crate) fn required_text(value: &str, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Core(CoreError::Validation(format!(
            "{field} is required"
        ))));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text field, treating blanks as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Lowercase and trim an e-mail address so lookups are case-insensitive.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_trims() {
        assert_eq!(required_text("  Leaking tap ", "subject").unwrap(), "Leaking tap");
    }

    #[test]
    fn required_text_rejects_blank() {
        let err = required_text("   ", "subject").unwrap_err();
        assert!(err.to_string().contains("subject is required"));
    }

    #[test]
    fn email_is_normalized() {
        assert_eq!(normalize_email(" Asha@Example.COM "), "asha@example.com");
    }
}
