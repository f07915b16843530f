//! Notice board models.

use hms_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `notices` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notice {
    pub id: DbId,
    pub title: String,
    pub content: String,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
}

/// DTO for posting a notice.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateNotice {
    pub title: String,
    pub content: String,
}

/// DTO for editing a notice. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateNotice {
    pub title: Option<String>,
    pub content: Option<String>,
}
