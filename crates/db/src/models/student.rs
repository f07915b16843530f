//! Student entity model, joined read model and DTOs.

use chrono::NaiveDate;
use hms_core::enrollment::EnrollmentState;
use hms_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `students` table.
#[derive(Debug, Clone, FromRow)]
pub struct Student {
    pub id: DbId,
    pub user_id: DbId,
    pub room_id: Option<DbId>,
    pub roll_number: String,
    pub profile_picture: Option<String>,
    pub course: Option<String>,
    pub contact_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub semesters_requested: i32,
    pub join_date: Option<NaiveDate>,
    pub status: String,
    pub is_enrollment_requested: bool,
    pub is_approved: bool,
    pub approval_date: Option<Timestamp>,
    pub rejected_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Student {
    pub fn enrollment_state(&self) -> EnrollmentState {
        EnrollmentState::from_flags(self.is_enrollment_requested, self.is_approved, &self.status)
    }
}

/// A student joined with its user account, room and fingerprint presence.
///
/// This is the shape returned by every student-facing and admin listing
/// endpoint.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StudentDetail {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub email: String,
    pub room_id: Option<DbId>,
    pub room_number: Option<String>,
    pub room_type: Option<String>,
    pub roll_number: String,
    pub profile_picture: Option<String>,
    pub course: Option<String>,
    pub contact_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub semesters_requested: i32,
    pub join_date: Option<NaiveDate>,
    pub status: String,
    pub is_enrollment_requested: bool,
    pub is_approved: bool,
    pub approval_date: Option<Timestamp>,
    pub rejected_at: Option<Timestamp>,
    pub has_fingerprint: bool,
    pub created_at: Timestamp,
}

impl StudentDetail {
    pub fn enrollment_state(&self) -> EnrollmentState {
        EnrollmentState::from_flags(self.is_enrollment_requested, self.is_approved, &self.status)
    }
}

/// Profile fields a student may change. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateStudentProfile {
    pub course: Option<String>,
    pub contact_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub semesters_requested: Option<i32>,
    pub profile_picture: Option<String>,
    /// `Some(true)` submits the enrollment request.
    pub is_enrollment_requested: Option<bool>,
}

/// Admin approval parameters.
#[derive(Debug, Clone)]
pub struct ApproveStudent {
    pub room_id: DbId,
    pub course: Option<String>,
    pub profile_picture: Option<String>,
}

/// Result of trying to place a student into a room.
#[derive(Debug)]
pub enum RoomAssignment {
    Assigned(Student),
    /// The student's enrollment state does not allow approval.
    InvalidState(EnrollmentState),
    RoomNotFound,
    RoomFull {
        room_number: String,
        capacity: i32,
        occupied: i64,
    },
}
