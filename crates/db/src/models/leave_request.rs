//! Leave request entity model and DTOs.

use chrono::NaiveDate;
use hms_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `leave_requests` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LeaveRequest {
    pub id: DbId,
    pub student_id: DbId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub status: String,
    pub admin_response: Option<String>,
    pub processed_at: Option<Timestamp>,
    pub processed_by: Option<DbId>,
    pub created_at: Timestamp,
}

/// DTO for filing a leave request.
#[derive(Debug, Clone)]
pub struct CreateLeaveRequest {
    pub student_id: DbId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
}

/// Admin decision on a pending request.
#[derive(Debug, Clone)]
pub struct ProcessLeaveRequest {
    pub status: String,
    pub admin_response: Option<String>,
    pub processed_by: DbId,
}
