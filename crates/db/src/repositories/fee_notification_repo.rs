//! Repository for the `fee_notifications` table.

use hms_core::types::DbId;
use sqlx::PgPool;

use crate::models::fee::{CreateFeeNotification, FeeNotification, FeeNotificationWithStudent};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, student_id, title, content, notification_type, is_read, created_at";

/// Provides operations on fee notifications.
pub struct FeeNotificationRepo;

impl FeeNotificationRepo {
    /// Send a fee notification to one student.
    pub async fn create(
        pool: &PgPool,
        input: &CreateFeeNotification,
    ) -> Result<FeeNotification, sqlx::Error> {
        let query = format!(
            "INSERT INTO fee_notifications (student_id, title, content, notification_type)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FeeNotification>(&query)
            .bind(input.student_id)
            .bind(&input.title)
            .bind(&input.content)
            .bind(&input.notification_type)
            .fetch_one(pool)
            .await
    }

    /// Notifications of one student, newest first.
    pub async fn list_for_student(
        pool: &PgPool,
        student_id: DbId,
    ) -> Result<Vec<FeeNotification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM fee_notifications
             WHERE student_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, FeeNotification>(&query)
            .bind(student_id)
            .fetch_all(pool)
            .await
    }

    /// Every notification with the recipient's roll number and name.
    pub async fn list_with_students(
        pool: &PgPool,
    ) -> Result<Vec<FeeNotificationWithStudent>, sqlx::Error> {
        sqlx::query_as::<_, FeeNotificationWithStudent>(
            "SELECT fn.id, fn.student_id, s.roll_number, u.name AS student_name,
                    fn.title, fn.content, fn.notification_type, fn.is_read, fn.created_at
             FROM fee_notifications fn
             JOIN students s ON s.id = fn.student_id
             JOIN users u ON u.id = s.user_id
             ORDER BY s.roll_number ASC, fn.created_at DESC",
        )
        .fetch_all(pool)
        .await
    }

    /// Mark one of the student's notifications read. Returns `false` if it
    /// does not exist or belongs to someone else.
    pub async fn mark_read(
        pool: &PgPool,
        id: DbId,
        student_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE fee_notifications SET is_read = true WHERE id = $1 AND student_id = $2",
        )
        .bind(id)
        .bind(student_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
