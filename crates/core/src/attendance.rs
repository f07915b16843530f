//! Attendance marking rules.
//!
//! Students mark themselves present once per day, only while an admin has
//! the attendance window open and only after their fingerprints are on file.
//! Admins can record any status for any date.

use crate::error::CoreError;

pub const ATTENDANCE_PRESENT: &str = "Present";
pub const ATTENDANCE_ABSENT: &str = "Absent";

/// All valid attendance status values.
pub const VALID_ATTENDANCE_STATUSES: &[&str] = &[ATTENDANCE_PRESENT, ATTENDANCE_ABSENT];

/// Validate an attendance status supplied by an admin.
pub fn validate_status(status: &str) -> Result<(), CoreError> {
    if VALID_ATTENDANCE_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid attendance status '{status}'. Must be one of: {}",
            VALID_ATTENDANCE_STATUSES.join(", ")
        )))
    }
}

/// What the server knows when a student asks to mark today's attendance.
#[derive(Debug, Clone, Copy)]
pub struct SelfMarkContext {
    pub window_open: bool,
    pub has_fingerprint: bool,
    pub already_marked_today: bool,
}

/// Decide whether a student may mark themselves present.
///
/// Checks run in the order the student would need to fix them.
pub fn ensure_student_can_mark(ctx: SelfMarkContext) -> Result<(), CoreError> {
    if !ctx.window_open {
        return Err(CoreError::Forbidden(
            "Attendance window is closed. Please wait for the admin to open it.".into(),
        ));
    }
    if !ctx.has_fingerprint {
        return Err(CoreError::Forbidden(
            "Fingerprint not registered. Please contact the admin to enroll your fingerprint."
                .into(),
        ));
    }
    if ctx.already_marked_today {
        return Err(CoreError::Validation(
            "Attendance already marked for today".into(),
        ));
    }
    Ok(())
}
