//! Feedback entity model and DTOs.

use hms_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Rating stored when the client omits one.
pub const DEFAULT_RATING: i32 = 5;

/// A row from the `feedback` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Feedback {
    pub id: DbId,
    pub user_id: DbId,
    pub content: String,
    pub rating: i32,
    pub is_read: bool,
    pub created_at: Timestamp,
}

/// DTO for submitting feedback.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFeedback {
    pub content: String,
    pub rating: Option<i32>,
}

/// DTO for editing feedback. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateFeedback {
    pub content: Option<String>,
    pub rating: Option<i32>,
}
