//! Attendance record and attendance window models.

use chrono::NaiveDate;
use hms_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `attendance` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Attendance {
    pub id: DbId,
    pub student_id: DbId,
    pub date: NaiveDate,
    pub status: String,
    pub marked_by: Option<DbId>,
    pub timestamp: Timestamp,
}

/// An attendance record joined with the student's name and roll number.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AttendanceDetail {
    pub id: DbId,
    pub student_id: DbId,
    pub student_name: String,
    pub roll_number: String,
    pub date: NaiveDate,
    pub status: String,
    pub marked_by: Option<DbId>,
    pub timestamp: Timestamp,
}

/// A row from the `attendance_windows` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AttendanceWindow {
    pub id: DbId,
    pub is_open: bool,
    pub opened_at: Option<Timestamp>,
    pub closed_at: Option<Timestamp>,
    pub opened_by: Option<DbId>,
    pub closed_by: Option<DbId>,
}
