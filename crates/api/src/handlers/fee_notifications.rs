//! Handlers for fee notifications sent by admins to students.

use std::collections::{BTreeMap, HashSet};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use hms_core::error::CoreError;
use hms_core::notifications::{FEE_NOTIFICATION_TYPE_PAYMENT, KIND_FEE_NOTIFICATION};
use hms_core::types::{DbId, Timestamp};
use hms_db::models::fee::{CreateFeeNotification, FeeNotification};
use hms_db::models::notice::CreateNotice;
use hms_db::repositories::{FeeNotificationRepo, NoticeRepo, NotificationRepo, StudentRepo};
use serde::{Deserialize, Serialize};

use super::{current_student, required_text};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireStudent};
use crate::response::{MessageResponse, UpdatedResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /fee-notifications`.
#[derive(Debug, Deserialize)]
pub struct SendFeeNotificationRequest {
    pub student_ids: Vec<DbId>,
    pub title: String,
    pub content: String,
    pub notification_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SendFeeNotificationResponse {
    pub message: String,
    pub notifications: Vec<FeeNotification>,
}

/// A student's notification with its dashboard-seen flag.
#[derive(Debug, Serialize)]
pub struct StudentFeeNotification {
    #[serde(flatten)]
    pub notification: FeeNotification,
    pub viewed_in_dashboard: bool,
}

/// One entry of the admin overview.
#[derive(Debug, Serialize)]
pub struct FeeNotificationEntry {
    pub id: DbId,
    pub title: String,
    pub content: String,
    pub notification_type: String,
    pub is_read: bool,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/fee-notifications
///
/// Send a notification to each selected student and publish it as a notice.
pub async fn send_fee_notifications(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<SendFeeNotificationRequest>,
) -> AppResult<(StatusCode, Json<SendFeeNotificationResponse>)> {
    let title = required_text(&input.title, "title")?;
    let content = required_text(&input.content, "content")?;
    let notification_type = input
        .notification_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(FEE_NOTIFICATION_TYPE_PAYMENT)
        .to_string();

    let existing = StudentRepo::existing_ids(&state.pool, &input.student_ids).await?;
    if existing.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "At least one existing student must be selected".into(),
        )));
    }

    let mut notifications = Vec::with_capacity(existing.len());
    for student_id in existing {
        let notification = FeeNotificationRepo::create(
            &state.pool,
            &CreateFeeNotification {
                student_id,
                title: title.clone(),
                content: content.clone(),
                notification_type: notification_type.clone(),
            },
        )
        .await?;
        notifications.push(notification);
    }

    let (notice, fanned_out) =
        NoticeRepo::create(&state.pool, admin.user_id, &CreateNotice { title, content }).await?;
    tracing::info!(
        count = notifications.len(),
        notice_id = notice.id,
        fanned_out,
        "Fee notifications sent"
    );

    Ok((
        StatusCode::CREATED,
        Json(SendFeeNotificationResponse {
            message: format!("Notification sent to {} students", notifications.len()),
            notifications,
        }),
    ))
}

/// GET /api/admin/fee-notifications
///
/// Every notification, grouped by `"ROLL - Name"`.
pub async fn list_all_grouped(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<BTreeMap<String, Vec<FeeNotificationEntry>>>> {
    let rows = FeeNotificationRepo::list_with_students(&state.pool).await?;

    let mut grouped: BTreeMap<String, Vec<FeeNotificationEntry>> = BTreeMap::new();
    for row in rows {
        grouped
            .entry(format!("{} - {}", row.roll_number, row.student_name))
            .or_default()
            .push(FeeNotificationEntry {
                id: row.id,
                title: row.title,
                content: row.content,
                notification_type: row.notification_type,
                is_read: row.is_read,
                created_at: row.created_at,
            });
    }
    Ok(Json(grouped))
}

/// GET /api/student/fee-notifications
pub async fn list_for_student(
    State(state): State<AppState>,
    RequireStudent(auth): RequireStudent,
) -> AppResult<Json<Vec<StudentFeeNotification>>> {
    let student = current_student(&state, &auth).await?;
    let notifications = FeeNotificationRepo::list_for_student(&state.pool, student.id).await?;
    let viewed: HashSet<DbId> =
        NotificationRepo::viewed_entity_ids(&state.pool, auth.user_id, KIND_FEE_NOTIFICATION)
            .await?
            .into_iter()
            .collect();

    Ok(Json(
        notifications
            .into_iter()
            .map(|n| StudentFeeNotification {
                viewed_in_dashboard: viewed.contains(&n.id),
                notification: n,
            })
            .collect(),
    ))
}

/// POST /api/student/fee-notifications/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    RequireStudent(auth): RequireStudent,
    Path(id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    let student = current_student(&state, &auth).await?;
    if !FeeNotificationRepo::mark_read(&state.pool, id, student.id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Fee notification",
            id,
        }));
    }
    Ok(Json(MessageResponse::new("Notification marked as read")))
}

/// POST /api/student/fee-notifications/mark-viewed-in-dashboard
pub async fn mark_viewed_in_dashboard(
    State(state): State<AppState>,
    RequireStudent(auth): RequireStudent,
) -> AppResult<Json<UpdatedResponse>> {
    let student = current_student(&state, &auth).await?;
    let ids: Vec<DbId> = FeeNotificationRepo::list_for_student(&state.pool, student.id)
        .await?
        .iter()
        .map(|n| n.id)
        .collect();

    let count =
        NotificationRepo::mark_viewed(&state.pool, auth.user_id, KIND_FEE_NOTIFICATION, &ids)
            .await?;
    Ok(Json(UpdatedResponse {
        message: "Fee notifications marked as viewed".into(),
        count,
    }))
}
