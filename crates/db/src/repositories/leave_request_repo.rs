//! Repository for the `leave_requests` table.

use hms_core::leave::LEAVE_STATUS_PENDING;
use hms_core::types::DbId;
use sqlx::PgPool;

use crate::models::leave_request::{CreateLeaveRequest, LeaveRequest, ProcessLeaveRequest};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, student_id, start_date, end_date, reason, status, admin_response, \
                       processed_at, processed_by, created_at";

/// Provides CRUD operations for leave requests.
pub struct LeaveRequestRepo;

impl LeaveRequestRepo {
    /// File a new pending leave request.
    pub async fn create(
        pool: &PgPool,
        input: &CreateLeaveRequest,
    ) -> Result<LeaveRequest, sqlx::Error> {
        let query = format!(
            "INSERT INTO leave_requests (student_id, start_date, end_date, reason)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LeaveRequest>(&query)
            .bind(input.student_id)
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(&input.reason)
            .fetch_one(pool)
            .await
    }

    /// Find a leave request by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<LeaveRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM leave_requests WHERE id = $1");
        sqlx::query_as::<_, LeaveRequest>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Requests of one student, newest first.
    pub async fn list_for_student(
        pool: &PgPool,
        student_id: DbId,
    ) -> Result<Vec<LeaveRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM leave_requests
             WHERE student_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, LeaveRequest>(&query)
            .bind(student_id)
            .fetch_all(pool)
            .await
    }

    /// Grant or deny a pending request.
    ///
    /// Returns `None` if the request no longer exists or is not pending.
    pub async fn process(
        pool: &PgPool,
        id: DbId,
        input: &ProcessLeaveRequest,
    ) -> Result<Option<LeaveRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE leave_requests SET
                status = $2,
                admin_response = $3,
                processed_by = $4,
                processed_at = NOW()
             WHERE id = $1 AND status = $5
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LeaveRequest>(&query)
            .bind(id)
            .bind(&input.status)
            .bind(&input.admin_response)
            .bind(input.processed_by)
            .bind(LEAVE_STATUS_PENDING)
            .fetch_optional(pool)
            .await
    }

    /// Cancel a pending request owned by `student_id`. Returns `true` if removed.
    pub async fn delete_pending(
        pool: &PgPool,
        id: DbId,
        student_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM leave_requests WHERE id = $1 AND student_id = $2 AND status = $3",
        )
        .bind(id)
        .bind(student_id)
        .bind(LEAVE_STATUS_PENDING)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
