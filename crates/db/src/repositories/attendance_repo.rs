//! Repositories for the `attendance` and `attendance_windows` tables.

use chrono::NaiveDate;
use hms_core::attendance::ATTENDANCE_PRESENT;
use hms_core::types::DbId;
use sqlx::PgPool;

use crate::models::attendance::{Attendance, AttendanceDetail, AttendanceWindow};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, student_id, date, status, marked_by, timestamp";

/// Joined select producing [`AttendanceDetail`] rows.
const DETAIL_SELECT: &str = "SELECT a.id, a.student_id, u.name AS student_name, s.roll_number, \
                                    a.date, a.status, a.marked_by, a.timestamp \
                             FROM attendance a \
                             JOIN students s ON s.id = a.student_id \
                             JOIN users u ON u.id = s.user_id";

/// Provides operations on daily attendance records.
pub struct AttendanceRepo;

impl AttendanceRepo {
    /// List attendance, newest date first. `student_id = None` lists everyone.
    pub async fn list(
        pool: &PgPool,
        student_id: Option<DbId>,
    ) -> Result<Vec<AttendanceDetail>, sqlx::Error> {
        let query = format!(
            "{DETAIL_SELECT}
             WHERE ($1::BIGINT IS NULL OR a.student_id = $1)
             ORDER BY a.date DESC, u.name ASC"
        );
        sqlx::query_as::<_, AttendanceDetail>(&query)
            .bind(student_id)
            .fetch_all(pool)
            .await
    }

    /// Find the record of `student_id` on `date`.
    pub async fn find_for_date(
        pool: &PgPool,
        student_id: DbId,
        date: NaiveDate,
    ) -> Result<Option<Attendance>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM attendance WHERE student_id = $1 AND date = $2");
        sqlx::query_as::<_, Attendance>(&query)
            .bind(student_id)
            .bind(date)
            .fetch_optional(pool)
            .await
    }

    /// Record a student marking themselves present.
    ///
    /// A concurrent second mark for the same day fails on
    /// `uq_attendance_student_date`.
    pub async fn create_self(
        pool: &PgPool,
        student_id: DbId,
        user_id: DbId,
        date: NaiveDate,
    ) -> Result<Attendance, sqlx::Error> {
        let query = format!(
            "INSERT INTO attendance (student_id, date, status, marked_by)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Attendance>(&query)
            .bind(student_id)
            .bind(date)
            .bind(ATTENDANCE_PRESENT)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Insert or overwrite the record of `student_id` on `date`.
    pub async fn upsert(
        pool: &PgPool,
        student_id: DbId,
        date: NaiveDate,
        status: &str,
        marked_by: DbId,
    ) -> Result<Attendance, sqlx::Error> {
        let query = format!(
            "INSERT INTO attendance (student_id, date, status, marked_by)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT ON CONSTRAINT uq_attendance_student_date DO UPDATE SET
                status = EXCLUDED.status,
                marked_by = EXCLUDED.marked_by,
                timestamp = NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Attendance>(&query)
            .bind(student_id)
            .bind(date)
            .bind(status)
            .bind(marked_by)
            .fetch_one(pool)
            .await
    }
}

/// Column list for attendance windows.
const WINDOW_COLUMNS: &str = "id, is_open, opened_at, closed_at, opened_by, closed_by";

/// Provides operations on the attendance window.
///
/// Only the most recent row matters; older rows are kept as history.
pub struct AttendanceWindowRepo;

impl AttendanceWindowRepo {
    /// The most recently opened window, if any.
    pub async fn latest(pool: &PgPool) -> Result<Option<AttendanceWindow>, sqlx::Error> {
        let query = format!(
            "SELECT {WINDOW_COLUMNS} FROM attendance_windows
             ORDER BY opened_at DESC NULLS LAST, id DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, AttendanceWindow>(&query)
            .fetch_optional(pool)
            .await
    }

    /// Whether the latest window is open.
    pub async fn is_open(pool: &PgPool) -> Result<bool, sqlx::Error> {
        Ok(Self::latest(pool).await?.is_some_and(|w| w.is_open))
    }

    /// Close any open windows and open a new one.
    pub async fn open(pool: &PgPool, admin_id: DbId) -> Result<AttendanceWindow, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "UPDATE attendance_windows SET is_open = false, closed_at = NOW(), closed_by = $1
             WHERE is_open = true",
        )
        .bind(admin_id)
        .execute(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO attendance_windows (is_open, opened_at, opened_by)
             VALUES (true, NOW(), $1)
             RETURNING {WINDOW_COLUMNS}"
        );
        let window = sqlx::query_as::<_, AttendanceWindow>(&query)
            .bind(admin_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(window)
    }

    /// Close the latest open window. Returns `None` when nothing was open.
    pub async fn close(
        pool: &PgPool,
        admin_id: DbId,
    ) -> Result<Option<AttendanceWindow>, sqlx::Error> {
        let query = format!(
            "UPDATE attendance_windows SET is_open = false, closed_at = NOW(), closed_by = $1
             WHERE id = (
                SELECT id FROM attendance_windows WHERE is_open = true
                ORDER BY opened_at DESC NULLS LAST, id DESC
                LIMIT 1
             )
             RETURNING {WINDOW_COLUMNS}"
        );
        sqlx::query_as::<_, AttendanceWindow>(&query)
            .bind(admin_id)
            .fetch_optional(pool)
            .await
    }
}
