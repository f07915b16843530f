//! Repository for the `user_sessions` table.
//!
//! A session row holds the SHA-256 hash of one refresh token. Tokens are
//! single-use: [`SessionRepo::consume`] revokes the row it returns, so a
//! replayed refresh token finds nothing.

use hms_core::types::DbId;
use sqlx::PgPool;

use crate::models::session::{CreateSession, UserSession};

const COLUMNS: &str = "id, user_id, refresh_token_hash, expires_at, is_revoked, created_at";

pub struct SessionRepo;

impl SessionRepo {
    pub async fn create(pool: &PgPool, input: &CreateSession) -> Result<UserSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_sessions (user_id, refresh_token_hash, expires_at)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(input.user_id)
            .bind(&input.refresh_token_hash)
            .bind(input.expires_at)
            .fetch_one(pool)
            .await
    }

    /// Revoke the live session holding `refresh_token_hash` and return it.
    ///
    /// Returns `None` for unknown, expired or already used tokens. Two
    /// concurrent calls with the same hash cannot both succeed.
    pub async fn consume(
        pool: &PgPool,
        refresh_token_hash: &str,
    ) -> Result<Option<UserSession>, sqlx::Error> {
        let query = format!(
            "UPDATE user_sessions SET is_revoked = true
             WHERE refresh_token_hash = $1
               AND is_revoked = false
               AND expires_at > NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(refresh_token_hash)
            .fetch_optional(pool)
            .await
    }

    /// Sign a user out everywhere. Returns the number of sessions revoked.
    pub async fn revoke_all_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_sessions SET is_revoked = true
             WHERE user_id = $1 AND is_revoked = false",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Purge sessions that can no longer be used.
    pub async fn cleanup_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM user_sessions WHERE is_revoked = true OR expires_at < NOW()")
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }
}
