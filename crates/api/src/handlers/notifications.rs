//! Handlers for notification badges and the student notice feed.
//!
//! Badge counters are role-specific: students count unseen replies and
//! notices, admins count complaints they have not opened. A caller asking
//! for the other role's counter gets zero; marking the other role's counter
//! viewed is forbidden.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use hms_core::notifications::{
    enrollment_notices, parse_notice_id, EnrollmentSnapshot, StudentNotice, KIND_APPROVAL,
    KIND_NEW_COMPLAINTS, KIND_REJECTION,
};
use hms_db::repositories::{ComplaintRepo, NotificationRepo};

use super::current_student;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequireStudent};
use crate::response::{CountResponse, MessageResponse, UpdatedResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Badge counters
// ---------------------------------------------------------------------------

/// GET /api/notifications/complaint-replies/count
pub async fn complaint_replies_count(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<CountResponse>> {
    let count = if auth.is_admin() {
        0
    } else {
        NotificationRepo::count_unviewed_complaint_replies(&state.pool, auth.user_id).await?
    };
    Ok(Json(CountResponse { count }))
}

/// POST /api/notifications/complaint-replies/mark-viewed
pub async fn mark_complaint_replies_viewed(
    State(state): State<AppState>,
    RequireStudent(user): RequireStudent,
) -> AppResult<Json<UpdatedResponse>> {
    let count = NotificationRepo::mark_complaint_replies_viewed(&state.pool, user.user_id).await?;
    Ok(Json(UpdatedResponse {
        message: "Complaint replies marked as viewed".into(),
        count,
    }))
}

/// GET /api/notifications/new-complaints/count
pub async fn new_complaints_count(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<CountResponse>> {
    let count = if auth.is_admin() {
        NotificationRepo::count_unviewed_complaints(&state.pool, auth.user_id, KIND_NEW_COMPLAINTS)
            .await?
    } else {
        0
    };
    Ok(Json(CountResponse { count }))
}

/// POST /api/notifications/new-complaints/mark-viewed
pub async fn mark_new_complaints_viewed(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> AppResult<Json<UpdatedResponse>> {
    let ids = ComplaintRepo::list_ids(&state.pool).await?;
    let count =
        NotificationRepo::mark_viewed(&state.pool, admin.user_id, KIND_NEW_COMPLAINTS, &ids)
            .await?;
    Ok(Json(UpdatedResponse {
        message: "Complaints marked as viewed".into(),
        count,
    }))
}

/// GET /api/notifications/new-notices/count
pub async fn new_notices_count(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<CountResponse>> {
    let count = if auth.is_admin() {
        0
    } else {
        NotificationRepo::count_unviewed_notices(&state.pool, auth.user_id).await?
    };
    Ok(Json(CountResponse { count }))
}

/// POST /api/notifications/new-notices/mark-viewed
pub async fn mark_notices_viewed(
    State(state): State<AppState>,
    RequireStudent(user): RequireStudent,
) -> AppResult<Json<UpdatedResponse>> {
    let count = NotificationRepo::mark_notices_viewed(&state.pool, user.user_id).await?;
    Ok(Json(UpdatedResponse {
        message: "Notices marked as viewed".into(),
        count,
    }))
}

// ---------------------------------------------------------------------------
// Student notice feed
// ---------------------------------------------------------------------------

/// GET /api/student/notifications
///
/// Approval and rejection notices derived from the enrollment record.
pub async fn list_student_notifications(
    State(state): State<AppState>,
    RequireStudent(user): RequireStudent,
) -> AppResult<Json<Vec<StudentNotice>>> {
    let student = current_student(&state, &user).await?;

    let approval_read =
        NotificationRepo::viewed_entity_ids(&state.pool, user.user_id, KIND_APPROVAL)
            .await?
            .contains(&student.id);
    let rejection_read =
        NotificationRepo::viewed_entity_ids(&state.pool, user.user_id, KIND_REJECTION)
            .await?
            .contains(&student.id);

    let snapshot = EnrollmentSnapshot {
        student_id: student.id,
        is_approved: student.is_approved,
        approval_date: student.approval_date,
        status: &student.status,
        rejected_at: student.rejected_at,
    };
    let notices = enrollment_notices(&snapshot, Utc::now(), |kind| match kind {
        KIND_APPROVAL => approval_read,
        KIND_REJECTION => rejection_read,
        _ => false,
    });

    Ok(Json(notices))
}

/// POST /api/student/notifications/{id}/read
///
/// `id` is a derived notice id such as `approval_12`; it must belong to the
/// caller.
pub async fn mark_student_notification_read(
    State(state): State<AppState>,
    RequireStudent(user): RequireStudent,
    Path(notice_id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let student = current_student(&state, &user).await?;

    let (kind, student_id) = parse_notice_id(&notice_id)
        .filter(|(_, id)| *id == student.id)
        .ok_or_else(|| AppError::NotFound(format!("Notification {notice_id} not found")))?;

    NotificationRepo::mark_viewed(&state.pool, user.user_id, kind, &[student_id]).await?;
    Ok(Json(MessageResponse::new("Notification marked as read")))
}
