//! Enrollment lifecycle of a student record.
//!
//! A student row carries three persisted fields that together describe where
//! the student is in the enrollment workflow: `is_enrollment_requested`,
//! `is_approved` and `status`. [`EnrollmentState`] folds them into one value
//! and the `ensure_*` helpers encode which admin/student actions are legal
//! from each state.
//!
//! ```text
//! Registered --submit--> Requested --approve--> Approved
//!                          |   ^                  |
//!                   reject |   | submit / mark    | reject / mark pending
//!                          v   |   pending        v
//!                         Rejected <--------------+
//! ```

use serde::Serialize;

use crate::error::CoreError;
use crate::types::DbId;

/// Student has a room (or is eligible for one) and is living in the hostel.
pub const STUDENT_STATUS_ACTIVE: &str = "active";

/// Enrollment request was turned down by an admin.
pub const STUDENT_STATUS_REJECTED: &str = "rejected";

/// Prefix of generated roll numbers.
pub const ROLL_NUMBER_PREFIX: &str = "HMS";

/// Derived enrollment state of a student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentState {
    /// Account exists, profile may be incomplete, nothing submitted.
    Registered,
    /// Enrollment submitted and waiting for an admin.
    Requested,
    /// Approved and assigned to a room.
    Approved,
    /// Rejected; the student may resubmit.
    Rejected,
}

impl EnrollmentState {
    /// Fold the persisted flags into a single state.
    ///
    /// A rejected status wins over the flags so a stale `is_approved` can
    /// never resurrect a rejected student.
    pub fn from_flags(is_enrollment_requested: bool, is_approved: bool, status: &str) -> Self {
        if status == STUDENT_STATUS_REJECTED {
            Self::Rejected
        } else if is_approved {
            Self::Approved
        } else if is_enrollment_requested {
            Self::Requested
        } else {
            Self::Registered
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Requested => "requested",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// Build the roll number assigned to a student at registration.
pub fn roll_number(user_id: DbId) -> String {
    format!("{ROLL_NUMBER_PREFIX}{user_id:04}")
}

/// A student may submit (or resubmit) an enrollment request.
pub fn ensure_can_submit(state: EnrollmentState) -> Result<(), CoreError> {
    match state {
        EnrollmentState::Registered | EnrollmentState::Rejected => Ok(()),
        EnrollmentState::Requested => Err(CoreError::Conflict(
            "Enrollment request already submitted and awaiting approval".into(),
        )),
        EnrollmentState::Approved => Err(CoreError::Conflict(
            "Student is already approved".into(),
        )),
    }
}

/// An admin may approve a pending request, or re-assign an approved student.
pub fn ensure_can_approve(state: EnrollmentState) -> Result<(), CoreError> {
    match state {
        EnrollmentState::Requested | EnrollmentState::Approved => Ok(()),
        EnrollmentState::Registered => Err(CoreError::Conflict(
            "Student has not requested enrollment".into(),
        )),
        EnrollmentState::Rejected => Err(CoreError::Conflict(
            "Student was rejected and must resubmit before approval".into(),
        )),
    }
}

/// An admin may reject a pending or approved student.
pub fn ensure_can_reject(state: EnrollmentState) -> Result<(), CoreError> {
    match state {
        EnrollmentState::Requested | EnrollmentState::Approved => Ok(()),
        EnrollmentState::Registered => Err(CoreError::Conflict(
            "Student has not requested enrollment".into(),
        )),
        EnrollmentState::Rejected => Err(CoreError::Conflict(
            "Student is already rejected".into(),
        )),
    }
}

/// An admin may move a decided student back to the pending queue.
pub fn ensure_can_mark_pending(state: EnrollmentState) -> Result<(), CoreError> {
    match state {
        EnrollmentState::Approved | EnrollmentState::Rejected => Ok(()),
        EnrollmentState::Requested => Err(CoreError::Conflict(
            "Student is already pending".into(),
        )),
        EnrollmentState::Registered => Err(CoreError::Conflict(
            "Student has not requested enrollment".into(),
        )),
    }
}

/// Whether course, contact number, date of birth and semesters may be edited.
///
/// They are frozen while an admin is reviewing the request.
pub fn restricted_fields_editable(state: EnrollmentState) -> bool {
    state != EnrollmentState::Requested
}

/// Fields that must be present before a request can be submitted.
#[derive(Debug, Default)]
pub struct EnrollmentFields<'a> {
    pub course: Option<&'a str>,
    pub contact_number: Option<&'a str>,
    pub has_date_of_birth: bool,
}

/// Validate that the profile is complete enough to request enrollment.
pub fn validate_request_fields(fields: &EnrollmentFields<'_>) -> Result<(), CoreError> {
    let mut missing = Vec::new();
    if fields.course.map_or(true, |c| c.trim().is_empty()) {
        missing.push("course");
    }
    if fields.contact_number.map_or(true, |c| c.trim().is_empty()) {
        missing.push("contact_number");
    }
    if !fields.has_date_of_birth {
        missing.push("date_of_birth");
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Missing required fields for enrollment: {}",
            missing.join(", ")
        )))
    }
}
