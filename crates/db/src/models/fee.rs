//! Fee and fee notification models.

use chrono::NaiveDate;
use hms_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `fees` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Fee {
    pub id: DbId,
    pub student_id: DbId,
    pub description: String,
    pub amount: f64,
    /// Stored status (`Pending` or `Paid`). See `hms_core::fees::effective_status`.
    pub status: String,
    pub due_date: Option<NaiveDate>,
    pub payment_date: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// DTO for creating a fee.
#[derive(Debug, Clone)]
pub struct CreateFee {
    pub student_id: DbId,
    pub description: String,
    pub amount: f64,
    pub due_date: Option<NaiveDate>,
}

/// A row from the `fee_notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FeeNotification {
    pub id: DbId,
    pub student_id: DbId,
    pub title: String,
    pub content: String,
    pub notification_type: String,
    pub is_read: bool,
    pub created_at: Timestamp,
}

/// A fee notification joined with the student it was sent to.
#[derive(Debug, Clone, FromRow)]
pub struct FeeNotificationWithStudent {
    pub id: DbId,
    pub student_id: DbId,
    pub roll_number: String,
    pub student_name: String,
    pub title: String,
    pub content: String,
    pub notification_type: String,
    pub is_read: bool,
    pub created_at: Timestamp,
}

/// DTO for creating a fee notification.
#[derive(Debug, Clone)]
pub struct CreateFeeNotification {
    pub student_id: DbId,
    pub title: String,
    pub content: String,
    pub notification_type: String,
}
