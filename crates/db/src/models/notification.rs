//! Unread-marker models behind the notification badges.

use hms_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `notification_states` table: `user_id` has seen `entity_id`
/// of kind `notification_type`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationState {
    pub id: DbId,
    pub user_id: DbId,
    pub notification_type: String,
    pub entity_id: DbId,
    pub viewed_at: Timestamp,
}

/// A row from the `complaint_notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ComplaintNotification {
    pub id: DbId,
    pub student_user_id: DbId,
    pub complaint_id: DbId,
    pub reply_id: DbId,
    pub is_viewed: bool,
    pub viewed_at: Option<Timestamp>,
    pub created_at: Timestamp,
}
