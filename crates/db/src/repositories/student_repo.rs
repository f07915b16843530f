//! Repository for the `students` table.

use hms_core::enrollment::{
    ensure_can_approve, roll_number, EnrollmentState, STUDENT_STATUS_ACTIVE,
    STUDENT_STATUS_REJECTED,
};
use hms_core::rooms::Occupancy;
use hms_core::otp::PURPOSE_REGISTRATION;
use hms_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::student::{
    ApproveStudent, RoomAssignment, Student, StudentDetail, UpdateStudentProfile,
};
use crate::models::user::{CreateUser, User};
use crate::repositories::{OtpRepo, UserRepo};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, room_id, roll_number, profile_picture, course, \
                       contact_number, date_of_birth, semesters_requested, join_date, status, \
                       is_enrollment_requested, is_approved, approval_date, rejected_at, \
                       created_at, updated_at";

/// Joined select producing [`StudentDetail`] rows. Append a `WHERE` clause.
const DETAIL_SELECT: &str = "SELECT s.id, s.user_id, u.name, u.email, s.room_id, \
                                    r.room_number, r.room_type, s.roll_number, \
                                    s.profile_picture, s.course, s.contact_number, \
                                    s.date_of_birth, s.semesters_requested, s.join_date, \
                                    s.status, s.is_enrollment_requested, s.is_approved, \
                                    s.approval_date, s.rejected_at, \
                                    EXISTS (SELECT 1 FROM fingerprint_data f \
                                            WHERE f.student_id = s.id) AS has_fingerprint, \
                                    s.created_at \
                             FROM students s \
                             JOIN users u ON u.id = s.user_id \
                             LEFT JOIN rooms r ON r.id = s.room_id";

/// Provides CRUD operations and enrollment transitions for students.
pub struct StudentRepo;

impl StudentRepo {
    /// Create the student record for a freshly registered user.
    ///
    /// The roll number is derived from the user id.
    pub async fn create_for_user<'e>(
        executor: impl PgExecutor<'e>,
        user_id: DbId,
    ) -> Result<Student, sqlx::Error> {
        let query = format!(
            "INSERT INTO students (user_id, roll_number)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Student>(&query)
            .bind(user_id)
            .bind(roll_number(user_id))
            .fetch_one(executor)
            .await
    }

    /// Finish a registration: consume the e-mailed code, then create the
    /// user account and its student record.
    ///
    /// Runs in one transaction, so a failure leaves the address free and
    /// the code unused. Returns `None` when the code does not match; the
    /// miss is still recorded against the code.
    pub async fn register(
        pool: &PgPool,
        input: &CreateUser,
        otp_code: &str,
    ) -> Result<Option<(User, Student)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if !OtpRepo::consume_in(&mut *tx, &input.email, PURPOSE_REGISTRATION, otp_code).await? {
            tx.commit().await?;
            return Ok(None);
        }

        let user = UserRepo::create(&mut *tx, input).await?;
        let student = Self::create_for_user(&mut *tx, user.id).await?;
        tx.commit().await?;
        Ok(Some((user, student)))
    }

    /// Find a student by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Student>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM students WHERE id = $1");
        sqlx::query_as::<_, Student>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the student record belonging to a user account.
    pub async fn find_by_user_id(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<Student>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM students WHERE user_id = $1");
        sqlx::query_as::<_, Student>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Find a student with user, room and fingerprint details.
    pub async fn find_detail_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<StudentDetail>, sqlx::Error> {
        let query = format!("{DETAIL_SELECT} WHERE s.id = $1");
        sqlx::query_as::<_, StudentDetail>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the detailed student record belonging to a user account.
    pub async fn find_detail_by_user_id(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<StudentDetail>, sqlx::Error> {
        let query = format!("{DETAIL_SELECT} WHERE s.user_id = $1");
        sqlx::query_as::<_, StudentDetail>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Students waiting for an admin decision, oldest request first.
    pub async fn list_pending(pool: &PgPool) -> Result<Vec<StudentDetail>, sqlx::Error> {
        let query = format!(
            "{DETAIL_SELECT}
             WHERE s.is_enrollment_requested = true
               AND s.is_approved = false
               AND s.status <> '{STUDENT_STATUS_REJECTED}'
             ORDER BY s.updated_at ASC"
        );
        sqlx::query_as::<_, StudentDetail>(&query)
            .fetch_all(pool)
            .await
    }

    /// Approved, active students ordered by roll number.
    pub async fn list_approved(pool: &PgPool) -> Result<Vec<StudentDetail>, sqlx::Error> {
        let query = format!(
            "{DETAIL_SELECT}
             WHERE s.is_approved = true AND s.status = '{STUDENT_STATUS_ACTIVE}'
             ORDER BY s.roll_number"
        );
        sqlx::query_as::<_, StudentDetail>(&query)
            .fetch_all(pool)
            .await
    }

    /// Approved occupants of a room other than `exclude_id`.
    pub async fn list_roommates(
        pool: &PgPool,
        room_id: DbId,
        exclude_id: DbId,
    ) -> Result<Vec<StudentDetail>, sqlx::Error> {
        let query = format!(
            "{DETAIL_SELECT}
             WHERE s.room_id = $1 AND s.id <> $2
               AND s.is_approved = true AND s.status = '{STUDENT_STATUS_ACTIVE}'
             ORDER BY u.name"
        );
        sqlx::query_as::<_, StudentDetail>(&query)
            .bind(room_id)
            .bind(exclude_id)
            .fetch_all(pool)
            .await
    }

    /// Return the subset of `ids` that exist, in ascending order.
    pub async fn existing_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>("SELECT id FROM students WHERE id = ANY($1) ORDER BY id")
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Apply a profile update. Only non-`None` fields in `input` are applied.
    ///
    /// Submitting a request (`is_enrollment_requested = Some(true)`) also
    /// clears a previous rejection so the student re-enters the pending queue.
    pub async fn update_profile(
        pool: &PgPool,
        id: DbId,
        input: &UpdateStudentProfile,
    ) -> Result<Option<Student>, sqlx::Error> {
        let query = format!(
            "UPDATE students SET
                course = COALESCE($2, course),
                contact_number = COALESCE($3, contact_number),
                date_of_birth = COALESCE($4, date_of_birth),
                semesters_requested = COALESCE($5, semesters_requested),
                profile_picture = COALESCE($6, profile_picture),
                is_enrollment_requested = COALESCE($7, is_enrollment_requested),
                status = CASE WHEN $7 IS TRUE THEN '{STUDENT_STATUS_ACTIVE}' ELSE status END,
                rejected_at = CASE WHEN $7 IS TRUE THEN NULL ELSE rejected_at END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Student>(&query)
            .bind(id)
            .bind(&input.course)
            .bind(&input.contact_number)
            .bind(input.date_of_birth)
            .bind(input.semesters_requested)
            .bind(&input.profile_picture)
            .bind(input.is_enrollment_requested)
            .fetch_optional(pool)
            .await
    }

    /// Approve a student into a room.
    ///
    /// The student row and then the room row are locked for the duration of
    /// the transaction. A reject committed in between is seen here and
    /// refused, and two concurrent approvals cannot both take the last bed.
    /// The student's own current placement does not count against the
    /// capacity.
    pub async fn approve(
        pool: &PgPool,
        id: DbId,
        input: &ApproveStudent,
    ) -> Result<RoomAssignment, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let (requested, approved, status): (bool, bool, String) = sqlx::query_as(
            "SELECT is_enrollment_requested, is_approved, status
             FROM students WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;

        let state = EnrollmentState::from_flags(requested, approved, &status);
        if ensure_can_approve(state).is_err() {
            return Ok(RoomAssignment::InvalidState(state));
        }

        let room: Option<(String, i32)> =
            sqlx::query_as("SELECT room_number, capacity FROM rooms WHERE id = $1 FOR UPDATE")
                .bind(input.room_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((room_number, capacity)) = room else {
            return Ok(RoomAssignment::RoomNotFound);
        };

        let occupied: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM students
             WHERE room_id = $1 AND id <> $2
               AND is_approved = true AND status = '{STUDENT_STATUS_ACTIVE}'"
        ))
        .bind(input.room_id)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if Occupancy::new(capacity, occupied).is_full() {
            tracing::debug!(student_id = id, room_id = input.room_id, occupied, "Room is full");
            return Ok(RoomAssignment::RoomFull {
                room_number,
                capacity,
                occupied,
            });
        }

        let query = format!(
            "UPDATE students SET
                room_id = $2,
                is_approved = true,
                is_enrollment_requested = true,
                status = '{STUDENT_STATUS_ACTIVE}',
                approval_date = NOW(),
                join_date = COALESCE(join_date, CURRENT_DATE),
                rejected_at = NULL,
                course = COALESCE($3, course),
                profile_picture = COALESCE($4, profile_picture)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let student = sqlx::query_as::<_, Student>(&query)
            .bind(id)
            .bind(input.room_id)
            .bind(&input.course)
            .bind(&input.profile_picture)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        tx.commit().await?;
        Ok(RoomAssignment::Assigned(student))
    }

    /// Reject a student: clear the room and approval, keep the record so the
    /// student can resubmit.
    pub async fn reject(pool: &PgPool, id: DbId) -> Result<Option<Student>, sqlx::Error> {
        let query = format!(
            "UPDATE students SET
                status = '{STUDENT_STATUS_REJECTED}',
                is_enrollment_requested = false,
                is_approved = false,
                approval_date = NULL,
                join_date = NULL,
                room_id = NULL,
                rejected_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Student>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Move a decided student back into the pending queue.
    pub async fn mark_pending(pool: &PgPool, id: DbId) -> Result<Option<Student>, sqlx::Error> {
        let query = format!(
            "UPDATE students SET
                status = '{STUDENT_STATUS_ACTIVE}',
                is_enrollment_requested = true,
                is_approved = false,
                approval_date = NULL,
                room_id = NULL,
                rejected_at = NULL
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Student>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Replace the stored profile picture path, returning the previous one.
    ///
    /// Returns `Ok(None)` both when there was no previous picture and when
    /// the student does not exist; callers check existence beforehand.
    pub async fn set_profile_picture(
        pool: &PgPool,
        id: DbId,
        path: &str,
    ) -> Result<Option<String>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let previous: Option<Option<String>> =
            sqlx::query_scalar("SELECT profile_picture FROM students WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        sqlx::query("UPDATE students SET profile_picture = $2 WHERE id = $1")
            .bind(id)
            .bind(path)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(previous.flatten())
    }
}
