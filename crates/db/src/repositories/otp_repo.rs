//! Repository for the `otp_codes` table.

use hms_core::otp::MAX_OTP_ATTEMPTS;
use hms_core::types::Timestamp;
use sqlx::{PgConnection, PgPool};

use crate::models::otp::OtpCode;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, email, code, purpose, is_verified, attempts, expires_at, created_at";

/// Issues and consumes one-time codes.
pub struct OtpRepo;

impl OtpRepo {
    /// Replace any unverified codes for `email`/`purpose` with a fresh one.
    pub async fn issue(
        pool: &PgPool,
        email: &str,
        purpose: &str,
        code: &str,
        expires_at: Timestamp,
    ) -> Result<OtpCode, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "DELETE FROM otp_codes
             WHERE lower(email) = lower($1) AND purpose = $2 AND is_verified = false",
        )
        .bind(email)
        .bind(purpose)
        .execute(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO otp_codes (email, code, purpose, expires_at)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        let otp = sqlx::query_as::<_, OtpCode>(&query)
            .bind(email)
            .bind(code)
            .bind(purpose)
            .bind(expires_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(otp)
    }

    /// Check `code` against the newest live code for `email`/`purpose`.
    ///
    /// Returns `true` when the code matched and was consumed. A code can be
    /// consumed once; a wrong guess counts against the live code, which is
    /// refused for good after [`MAX_OTP_ATTEMPTS`] misses.
    pub async fn consume(
        pool: &PgPool,
        email: &str,
        purpose: &str,
        code: &str,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let consumed = Self::consume_in(&mut *tx, email, purpose, code).await?;
        tx.commit().await?;
        Ok(consumed)
    }

    /// [`OtpRepo::consume`] on a caller-owned transaction. The caller must
    /// commit even on a miss so the failed attempt is recorded.
    pub(crate) async fn consume_in(
        conn: &mut PgConnection,
        email: &str,
        purpose: &str,
        code: &str,
    ) -> Result<bool, sqlx::Error> {
        let live: Option<(i64, String)> = sqlx::query_as(
            "SELECT id, code FROM otp_codes
             WHERE lower(email) = lower($1)
               AND purpose = $2
               AND is_verified = false
               AND expires_at > NOW()
               AND attempts < $3
             ORDER BY created_at DESC, id DESC
             LIMIT 1
             FOR UPDATE",
        )
        .bind(email)
        .bind(purpose)
        .bind(MAX_OTP_ATTEMPTS)
        .fetch_optional(&mut *conn)
        .await?;

        let Some((id, expected)) = live else {
            return Ok(false);
        };

        if expected == code {
            sqlx::query("UPDATE otp_codes SET is_verified = true WHERE id = $1")
                .bind(id)
                .execute(&mut *conn)
                .await?;
            Ok(true)
        } else {
            sqlx::query("UPDATE otp_codes SET attempts = attempts + 1 WHERE id = $1")
                .bind(id)
                .execute(&mut *conn)
                .await?;
            tracing::debug!(otp_id = id, "Wrong OTP guess recorded");
            Ok(false)
        }
    }

    /// Delete codes that expired before now. Returns the count of deleted rows.
    pub async fn cleanup_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM otp_codes WHERE expires_at < NOW()")
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
