//! Repositories for the `complaints` and `complaint_replies` tables.

use hms_core::types::DbId;
use sqlx::PgPool;

use crate::models::complaint::{
    Complaint, ComplaintDetail, ComplaintReply, ComplaintReplyDetail, CreateComplaint,
    UpdateComplaint,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, subject, details, status, created_at, updated_at";

/// Joined select producing [`ComplaintDetail`] rows.
const DETAIL_SELECT: &str = "SELECT c.id, c.user_id, c.subject, c.details, c.status, \
                                    u.name AS student_name, \
                                    s.roll_number AS student_roll_number, \
                                    s.profile_picture AS student_profile_picture, \
                                    c.created_at, c.updated_at \
                             FROM complaints c \
                             JOIN users u ON u.id = c.user_id \
                             LEFT JOIN students s ON s.user_id = c.user_id";

/// Provides CRUD operations for complaints.
pub struct ComplaintRepo;

impl ComplaintRepo {
    /// File a complaint on behalf of `user_id`.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateComplaint,
    ) -> Result<Complaint, sqlx::Error> {
        let query = format!(
            "INSERT INTO complaints (user_id, subject, details)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Complaint>(&query)
            .bind(user_id)
            .bind(&input.subject)
            .bind(&input.details)
            .fetch_one(pool)
            .await
    }

    /// Find a complaint by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Complaint>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM complaints WHERE id = $1");
        sqlx::query_as::<_, Complaint>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a complaint with author details.
    pub async fn find_detail(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ComplaintDetail>, sqlx::Error> {
        let query = format!("{DETAIL_SELECT} WHERE c.id = $1");
        sqlx::query_as::<_, ComplaintDetail>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List complaints, newest first. `user_id = None` lists everyone's.
    pub async fn list(
        pool: &PgPool,
        user_id: Option<DbId>,
    ) -> Result<Vec<ComplaintDetail>, sqlx::Error> {
        let query = format!(
            "{DETAIL_SELECT}
             WHERE ($1::BIGINT IS NULL OR c.user_id = $1)
             ORDER BY c.created_at DESC"
        );
        sqlx::query_as::<_, ComplaintDetail>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Update a complaint. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateComplaint,
    ) -> Result<Option<Complaint>, sqlx::Error> {
        let query = format!(
            "UPDATE complaints SET
                subject = COALESCE($2, subject),
                details = COALESCE($3, details),
                status = COALESCE($4, status)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Complaint>(&query)
            .bind(id)
            .bind(&input.subject)
            .bind(&input.details)
            .bind(&input.status)
            .fetch_optional(pool)
            .await
    }

    /// Delete a complaint and its replies. Returns `true` if removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM complaints WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Total number of complaints.
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM complaints")
            .fetch_one(pool)
            .await
    }

    /// IDs of every complaint.
    pub async fn list_ids(pool: &PgPool) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>("SELECT id FROM complaints ORDER BY id")
            .fetch_all(pool)
            .await
    }
}

/// Column list for replies.
const REPLY_COLUMNS: &str = "id, complaint_id, user_id, content, is_admin, created_at, updated_at";

/// Joined select producing [`ComplaintReplyDetail`] rows.
const REPLY_DETAIL_SELECT: &str = "SELECT cr.id, cr.complaint_id, cr.user_id, \
                                          u.name AS user_name, \
                                          CASE WHEN cr.is_admin THEN NULL \
                                               ELSE s.profile_picture END AS user_profile_picture, \
                                          cr.content, cr.is_admin, cr.created_at, cr.updated_at \
                                   FROM complaint_replies cr \
                                   JOIN users u ON u.id = cr.user_id \
                                   LEFT JOIN students s ON s.user_id = cr.user_id";

/// Provides CRUD operations for complaint replies.
pub struct ComplaintReplyRepo;

impl ComplaintReplyRepo {
    /// Add a reply to a complaint.
    pub async fn create(
        pool: &PgPool,
        complaint_id: DbId,
        user_id: DbId,
        content: &str,
        is_admin: bool,
    ) -> Result<ComplaintReply, sqlx::Error> {
        let query = format!(
            "INSERT INTO complaint_replies (complaint_id, user_id, content, is_admin)
             VALUES ($1, $2, $3, $4)
             RETURNING {REPLY_COLUMNS}"
        );
        sqlx::query_as::<_, ComplaintReply>(&query)
            .bind(complaint_id)
            .bind(user_id)
            .bind(content)
            .bind(is_admin)
            .fetch_one(pool)
            .await
    }

    /// Find a reply that belongs to `complaint_id`.
    pub async fn find(
        pool: &PgPool,
        complaint_id: DbId,
        reply_id: DbId,
    ) -> Result<Option<ComplaintReply>, sqlx::Error> {
        let query = format!(
            "SELECT {REPLY_COLUMNS} FROM complaint_replies WHERE id = $1 AND complaint_id = $2"
        );
        sqlx::query_as::<_, ComplaintReply>(&query)
            .bind(reply_id)
            .bind(complaint_id)
            .fetch_optional(pool)
            .await
    }

    /// Find a reply with author details.
    pub async fn find_detail(
        pool: &PgPool,
        reply_id: DbId,
    ) -> Result<Option<ComplaintReplyDetail>, sqlx::Error> {
        let query = format!("{REPLY_DETAIL_SELECT} WHERE cr.id = $1");
        sqlx::query_as::<_, ComplaintReplyDetail>(&query)
            .bind(reply_id)
            .fetch_optional(pool)
            .await
    }

    /// Replies of several complaints, oldest first.
    pub async fn list_for_complaints(
        pool: &PgPool,
        complaint_ids: &[DbId],
    ) -> Result<Vec<ComplaintReplyDetail>, sqlx::Error> {
        let query = format!(
            "{REPLY_DETAIL_SELECT}
             WHERE cr.complaint_id = ANY($1)
             ORDER BY cr.created_at ASC, cr.id ASC"
        );
        sqlx::query_as::<_, ComplaintReplyDetail>(&query)
            .bind(complaint_ids)
            .fetch_all(pool)
            .await
    }

    /// Edit a reply's content.
    pub async fn update_content(
        pool: &PgPool,
        reply_id: DbId,
        content: &str,
    ) -> Result<Option<ComplaintReply>, sqlx::Error> {
        let query = format!(
            "UPDATE complaint_replies SET content = $2 WHERE id = $1 RETURNING {REPLY_COLUMNS}"
        );
        sqlx::query_as::<_, ComplaintReply>(&query)
            .bind(reply_id)
            .bind(content)
            .fetch_optional(pool)
            .await
    }

    /// Delete a reply. Returns `true` if removed.
    pub async fn delete(pool: &PgPool, reply_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM complaint_replies WHERE id = $1")
            .bind(reply_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
