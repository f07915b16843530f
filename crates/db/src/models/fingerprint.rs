//! Fingerprint template storage models.

use hms_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `fingerprint_data` table.
///
/// Templates are hex strings and never leave the server.
#[derive(Debug, Clone, FromRow)]
pub struct FingerprintData {
    pub id: DbId,
    pub student_id: DbId,
    pub right_thumb_template: Option<String>,
    pub left_thumb_template: Option<String>,
    pub device_id: Option<String>,
    pub created_at: Timestamp,
    pub last_updated: Timestamp,
}

/// Template-free summary safe to return to clients.
#[derive(Debug, Clone, Serialize)]
pub struct FingerprintSummary {
    pub id: DbId,
    pub student_id: DbId,
    pub has_fingerprint: bool,
    pub has_right_thumb: bool,
    pub has_left_thumb: bool,
    pub device_id: Option<String>,
    pub created_at: Timestamp,
    pub last_updated: Timestamp,
}

impl From<&FingerprintData> for FingerprintSummary {
    fn from(data: &FingerprintData) -> Self {
        let has_right_thumb = data.right_thumb_template.is_some();
        let has_left_thumb = data.left_thumb_template.is_some();
        Self {
            id: data.id,
            student_id: data.student_id,
            has_fingerprint: has_right_thumb || has_left_thumb,
            has_right_thumb,
            has_left_thumb,
            device_id: data.device_id.clone(),
            created_at: data.created_at,
            last_updated: data.last_updated,
        }
    }
}

/// DTO for storing a student's templates. `None` keeps the existing value.
#[derive(Debug, Clone, Default)]
pub struct UpsertFingerprint {
    pub right_thumb_template: Option<String>,
    pub left_thumb_template: Option<String>,
    pub device_id: Option<String>,
}

/// Per-student enrollment overview for the admin fingerprint page.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FingerprintStatusRow {
    pub student_id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub email: String,
    pub roll_number: String,
    pub room_number: Option<String>,
    pub has_fingerprint: bool,
    pub has_right_thumb: bool,
    pub has_left_thumb: bool,
    pub last_updated: Option<Timestamp>,
}
