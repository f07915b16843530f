//! Complaint and complaint reply models.

use hms_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const COMPLAINT_STATUS_PENDING: &str = "Pending";
pub const COMPLAINT_STATUS_IN_PROGRESS: &str = "In Progress";
pub const COMPLAINT_STATUS_RESOLVED: &str = "Resolved";

/// All valid complaint status values.
pub const VALID_COMPLAINT_STATUSES: &[&str] = &[
    COMPLAINT_STATUS_PENDING,
    COMPLAINT_STATUS_IN_PROGRESS,
    COMPLAINT_STATUS_RESOLVED,
];

/// A row from the `complaints` table.
#[derive(Debug, Clone, FromRow)]
pub struct Complaint {
    pub id: DbId,
    pub user_id: DbId,
    pub subject: String,
    pub details: String,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A complaint joined with its author.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ComplaintDetail {
    pub id: DbId,
    pub user_id: DbId,
    pub subject: String,
    pub details: String,
    pub status: String,
    pub student_name: String,
    pub student_roll_number: Option<String>,
    pub student_profile_picture: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `complaint_replies` table.
#[derive(Debug, Clone, FromRow)]
pub struct ComplaintReply {
    pub id: DbId,
    pub complaint_id: DbId,
    pub user_id: DbId,
    pub content: String,
    pub is_admin: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A reply joined with its author.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ComplaintReplyDetail {
    pub id: DbId,
    pub complaint_id: DbId,
    pub user_id: DbId,
    pub user_name: String,
    /// Only set for student authors.
    pub user_profile_picture: Option<String>,
    pub content: String,
    pub is_admin: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for filing a complaint.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateComplaint {
    pub subject: String,
    pub details: String,
}

/// DTO for updating a complaint. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateComplaint {
    pub subject: Option<String>,
    pub details: Option<String>,
    pub status: Option<String>,
}
