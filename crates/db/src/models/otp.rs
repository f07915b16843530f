//! One-time password rows.

use hms_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `otp_codes` table.
#[derive(Debug, Clone, FromRow)]
pub struct OtpCode {
    pub id: DbId,
    pub email: String,
    pub code: String,
    pub purpose: String,
    pub is_verified: bool,
    /// Failed guesses against this code.
    pub attempts: i32,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
}
