//! Repository for the `notices` table.

use hms_core::types::DbId;
use sqlx::PgPool;

use crate::models::notice::{CreateNotice, Notice, UpdateNotice};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, content, created_by, created_at";

/// Provides CRUD operations for notices.
pub struct NoticeRepo;

impl NoticeRepo {
    /// Publish a notice and queue an unviewed notification for every student.
    ///
    /// Returns the notice and the number of notifications created.
    pub async fn create(
        pool: &PgPool,
        created_by: DbId,
        input: &CreateNotice,
    ) -> Result<(Notice, u64), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO notices (title, content, created_by)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        let notice = sqlx::query_as::<_, Notice>(&query)
            .bind(&input.title)
            .bind(&input.content)
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await?;

        let fanned_out = sqlx::query(
            "INSERT INTO notice_notifications (student_user_id, notice_id)
             SELECT user_id, $1 FROM students
             ON CONFLICT ON CONSTRAINT uq_notice_notifications_student_notice DO NOTHING",
        )
        .bind(notice.id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;
        Ok((notice, fanned_out))
    }

    /// Find a notice by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Notice>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notices WHERE id = $1");
        sqlx::query_as::<_, Notice>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All notices, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Notice>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notices ORDER BY created_at DESC, id DESC");
        sqlx::query_as::<_, Notice>(&query).fetch_all(pool).await
    }

    /// Update a notice. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateNotice,
    ) -> Result<Option<Notice>, sqlx::Error> {
        let query = format!(
            "UPDATE notices SET
                title = COALESCE($2, title),
                content = COALESCE($3, content)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notice>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.content)
            .fetch_optional(pool)
            .await
    }

    /// Delete a notice and its notifications. Returns `true` if removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notices WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
