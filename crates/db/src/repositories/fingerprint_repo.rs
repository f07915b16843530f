//! Repository for the `fingerprint_data` table.

use hms_core::types::DbId;
use sqlx::PgPool;

use crate::models::fingerprint::{FingerprintData, FingerprintStatusRow, UpsertFingerprint};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, student_id, right_thumb_template, left_thumb_template, device_id, \
                       created_at, last_updated";

/// Provides operations on stored fingerprint templates.
pub struct FingerprintRepo;

impl FingerprintRepo {
    /// Templates on file for a student.
    pub async fn find_by_student(
        pool: &PgPool,
        student_id: DbId,
    ) -> Result<Option<FingerprintData>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM fingerprint_data WHERE student_id = $1");
        sqlx::query_as::<_, FingerprintData>(&query)
            .bind(student_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert or update a student's templates.
    ///
    /// Fields that are `None` keep their stored value. The returned flag is
    /// `true` when a new row was created.
    pub async fn upsert(
        pool: &PgPool,
        student_id: DbId,
        input: &UpsertFingerprint,
    ) -> Result<(FingerprintData, bool), sqlx::Error> {
        let query = format!(
            "INSERT INTO fingerprint_data
                (student_id, right_thumb_template, left_thumb_template, device_id)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT ON CONSTRAINT uq_fingerprint_data_student_id DO UPDATE SET
                right_thumb_template = COALESCE(EXCLUDED.right_thumb_template,
                                                fingerprint_data.right_thumb_template),
                left_thumb_template = COALESCE(EXCLUDED.left_thumb_template,
                                               fingerprint_data.left_thumb_template),
                device_id = COALESCE(EXCLUDED.device_id, fingerprint_data.device_id),
                last_updated = NOW()
             RETURNING {COLUMNS}, (xmax = 0) AS inserted"
        );
        let row = sqlx::query_as::<_, UpsertRow>(&query)
            .bind(student_id)
            .bind(&input.right_thumb_template)
            .bind(&input.left_thumb_template)
            .bind(&input.device_id)
            .fetch_one(pool)
            .await?;
        Ok((row.data, row.inserted))
    }

    /// Fingerprint enrollment overview of every approved student.
    pub async fn status_rows(pool: &PgPool) -> Result<Vec<FingerprintStatusRow>, sqlx::Error> {
        sqlx::query_as::<_, FingerprintStatusRow>(
            "SELECT s.id AS student_id, s.user_id, u.name, u.email, s.roll_number,
                    r.room_number,
                    (f.id IS NOT NULL) AS has_fingerprint,
                    (f.right_thumb_template IS NOT NULL) AS has_right_thumb,
                    (f.left_thumb_template IS NOT NULL) AS has_left_thumb,
                    f.last_updated
             FROM students s
             JOIN users u ON u.id = s.user_id
             LEFT JOIN rooms r ON r.id = s.room_id
             LEFT JOIN fingerprint_data f ON f.student_id = s.id
             WHERE s.is_approved = true
             ORDER BY s.roll_number ASC",
        )
        .fetch_all(pool)
        .await
    }
}

/// Row returned by [`FingerprintRepo::upsert`].
#[derive(sqlx::FromRow)]
struct UpsertRow {
    #[sqlx(flatten)]
    data: FingerprintData,
    inserted: bool,
}
