//! Repository for the `feedback` table.

use hms_core::types::DbId;
use sqlx::PgPool;

use crate::models::feedback::{CreateFeedback, Feedback, UpdateFeedback, DEFAULT_RATING};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, content, rating, is_read, created_at";

/// Provides CRUD operations for feedback.
pub struct FeedbackRepo;

impl FeedbackRepo {
    /// Store feedback from `user_id`.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateFeedback,
    ) -> Result<Feedback, sqlx::Error> {
        let query = format!(
            "INSERT INTO feedback (user_id, content, rating)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Feedback>(&query)
            .bind(user_id)
            .bind(&input.content)
            .bind(input.rating.unwrap_or(DEFAULT_RATING))
            .fetch_one(pool)
            .await
    }

    /// Find feedback by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Feedback>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM feedback WHERE id = $1");
        sqlx::query_as::<_, Feedback>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List feedback, newest first. `user_id = None` lists everyone's.
    pub async fn list(pool: &PgPool, user_id: Option<DbId>) -> Result<Vec<Feedback>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM feedback
             WHERE ($1::BIGINT IS NULL OR user_id = $1)
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Feedback>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Update feedback. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateFeedback,
    ) -> Result<Option<Feedback>, sqlx::Error> {
        let query = format!(
            "UPDATE feedback SET
                content = COALESCE($2, content),
                rating = COALESCE($3, rating)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Feedback>(&query)
            .bind(id)
            .bind(&input.content)
            .bind(input.rating)
            .fetch_optional(pool)
            .await
    }

    /// Delete feedback. Returns `true` if removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM feedback WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark feedback as read. An empty `ids` marks everything.
    ///
    /// Returns the number of rows that changed.
    pub async fn mark_read(pool: &PgPool, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE feedback SET is_read = true
             WHERE is_read = false AND (cardinality($1::BIGINT[]) = 0 OR id = ANY($1))",
        )
        .bind(ids)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
