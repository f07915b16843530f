//! Repository for notification bookkeeping: `notification_states`,
//! `complaint_notifications` and `notice_notifications`.

use hms_core::types::DbId;
use sqlx::PgPool;

use crate::models::notification::ComplaintNotification;

/// Provides operations on "seen" markers and per-user notification queues.
pub struct NotificationRepo;

impl NotificationRepo {
    // ------------------------------------------------------------------
    // notification_states
    // ------------------------------------------------------------------

    /// Record that `user_id` viewed each of `entity_ids` of `kind`.
    ///
    /// Already-viewed entities are left untouched. Returns the number of new
    /// markers.
    pub async fn mark_viewed(
        pool: &PgPool,
        user_id: DbId,
        kind: &str,
        entity_ids: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        if entity_ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "INSERT INTO notification_states (user_id, notification_type, entity_id)
             SELECT $1, $2, UNNEST($3::BIGINT[])
             ON CONFLICT ON CONSTRAINT uq_notification_states_user_type_entity DO NOTHING",
        )
        .bind(user_id)
        .bind(kind)
        .bind(entity_ids)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Entity ids of `kind` already viewed by `user_id`.
    pub async fn viewed_entity_ids(
        pool: &PgPool,
        user_id: DbId,
        kind: &str,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT entity_id FROM notification_states
             WHERE user_id = $1 AND notification_type = $2",
        )
        .bind(user_id)
        .bind(kind)
        .fetch_all(pool)
        .await
    }

    /// Number of complaints the admin `user_id` has not viewed yet.
    pub async fn count_unviewed_complaints(
        pool: &PgPool,
        user_id: DbId,
        kind: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM complaints c
             WHERE NOT EXISTS (
                SELECT 1 FROM notification_states ns
                WHERE ns.user_id = $1 AND ns.notification_type = $2 AND ns.entity_id = c.id
             )",
        )
        .bind(user_id)
        .bind(kind)
        .fetch_one(pool)
        .await
    }

    // ------------------------------------------------------------------
    // complaint_notifications
    // ------------------------------------------------------------------

    /// Queue a notification for a complaint author about a new reply.
    pub async fn create_complaint_notification(
        pool: &PgPool,
        student_user_id: DbId,
        complaint_id: DbId,
        reply_id: DbId,
    ) -> Result<ComplaintNotification, sqlx::Error> {
        sqlx::query_as::<_, ComplaintNotification>(
            "INSERT INTO complaint_notifications (student_user_id, complaint_id, reply_id)
             VALUES ($1, $2, $3)
             RETURNING id, student_user_id, complaint_id, reply_id, is_viewed, viewed_at,
                       created_at",
        )
        .bind(student_user_id)
        .bind(complaint_id)
        .bind(reply_id)
        .fetch_one(pool)
        .await
    }

    /// Unviewed complaint-reply notifications of a student.
    pub async fn count_unviewed_complaint_replies(
        pool: &PgPool,
        student_user_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM complaint_notifications
             WHERE student_user_id = $1 AND is_viewed = false",
        )
        .bind(student_user_id)
        .fetch_one(pool)
        .await
    }

    /// Mark all of a student's complaint-reply notifications viewed.
    pub async fn mark_complaint_replies_viewed(
        pool: &PgPool,
        student_user_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE complaint_notifications SET is_viewed = true, viewed_at = NOW()
             WHERE student_user_id = $1 AND is_viewed = false",
        )
        .bind(student_user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    // ------------------------------------------------------------------
    // notice_notifications
    // ------------------------------------------------------------------

    /// Unviewed notice notifications of a student.
    pub async fn count_unviewed_notices(
        pool: &PgPool,
        student_user_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM notice_notifications
             WHERE student_user_id = $1 AND is_viewed = false",
        )
        .bind(student_user_id)
        .fetch_one(pool)
        .await
    }

    /// Mark all of a student's notice notifications viewed.
    pub async fn mark_notices_viewed(
        pool: &PgPool,
        student_user_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notice_notifications SET is_viewed = true, viewed_at = NOW()
             WHERE student_user_id = $1 AND is_viewed = false",
        )
        .bind(student_user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
