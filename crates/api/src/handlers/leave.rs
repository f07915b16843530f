//! Handlers for leave requests.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use hms_core::error::CoreError;
use hms_core::leave::{
    ensure_pending, normalize_reason, validate_dates, LEAVE_STATUS_DENIED, LEAVE_STATUS_GRANTED,
};
use hms_core::profile::parse_date;
use hms_core::types::DbId;
use hms_db::models::leave_request::{CreateLeaveRequest, LeaveRequest, ProcessLeaveRequest};
use hms_db::repositories::{LeaveRequestRepo, StudentRepo};
use hms_events::bus::EVENT_LEAVE_PROCESSED;
use hms_events::HostelEvent;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{current_student, today};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireStudent};
use crate::response::MessageResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /student/leave-requests`. Dates are `YYYY-MM-DD`.
#[derive(Debug, Deserialize)]
pub struct LeaveRequestBody {
    pub start_date: String,
    pub end_date: String,
    pub reason: String,
}

/// Request body for `POST /admin/leave-requests/{id}/deny`.
#[derive(Debug, Default, Deserialize)]
pub struct DenyRequest {
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct LeaveResponse {
    pub message: String,
    pub leave_request: LeaveRequest,
}

// ---------------------------------------------------------------------------
// Student handlers
// ---------------------------------------------------------------------------

/// GET /api/student/leave-requests
pub async fn list_own(
    State(state): State<AppState>,
    RequireStudent(user): RequireStudent,
) -> AppResult<Json<Vec<LeaveRequest>>> {
    let student = current_student(&state, &user).await?;
    Ok(Json(
        LeaveRequestRepo::list_for_student(&state.pool, student.id).await?,
    ))
}

/// POST /api/student/leave-requests
pub async fn create_leave_request(
    State(state): State<AppState>,
    RequireStudent(user): RequireStudent,
    Json(input): Json<LeaveRequestBody>,
) -> AppResult<(StatusCode, Json<LeaveResponse>)> {
    let student = current_student(&state, &user).await?;

    let start_date = parse_date(&input.start_date, "start_date")?;
    let end_date = parse_date(&input.end_date, "end_date")?;
    validate_dates(start_date, end_date, today())?;
    let reason = normalize_reason(&input.reason, "Reason")?;

    let leave_request = LeaveRequestRepo::create(
        &state.pool,
        &CreateLeaveRequest {
            student_id: student.id,
            start_date,
            end_date,
            reason,
        },
    )
    .await?;
    tracing::info!(
        leave_request_id = leave_request.id,
        student_id = student.id,
        %start_date,
        %end_date,
        "Leave request filed",
    );

    Ok((
        StatusCode::CREATED,
        Json(LeaveResponse {
            message: "Leave request submitted successfully".into(),
            leave_request,
        }),
    ))
}

/// DELETE /api/student/leave-requests/{id}
///
/// Only the owner may cancel, and only while the request is pending.
pub async fn delete_leave_request(
    State(state): State<AppState>,
    RequireStudent(user): RequireStudent,
    Path(id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    let student = current_student(&state, &user).await?;
    let leave_request = find_leave_request(&state, id).await?;
    if leave_request.student_id != student.id {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "LeaveRequest",
            id,
        }));
    }
    ensure_pending(&leave_request.status)?;

    if !LeaveRequestRepo::delete_pending(&state.pool, id, student.id).await? {
        // Processed between the read and the delete.
        return Err(AppError::Core(CoreError::Validation(
            "Leave request has already been processed".into(),
        )));
    }
    tracing::info!(leave_request_id = id, student_id = student.id, "Leave request cancelled");

    Ok(Json(MessageResponse::new("Leave request cancelled")))
}

// ---------------------------------------------------------------------------
// Admin handlers
// ---------------------------------------------------------------------------

/// GET /api/admin/students/{id}/leave-requests
pub async fn list_for_student(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(student_id): Path<DbId>,
) -> AppResult<Json<Vec<LeaveRequest>>> {
    StudentRepo::find_by_id(&state.pool, student_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Student",
            id: student_id,
        }))?;
    Ok(Json(
        LeaveRequestRepo::list_for_student(&state.pool, student_id).await?,
    ))
}

/// POST /api/admin/leave-requests/{id}/grant
pub async fn grant_leave_request(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<LeaveResponse>> {
    let leave_request = process(&state, admin.user_id, id, LEAVE_STATUS_GRANTED, None).await?;
    Ok(Json(LeaveResponse {
        message: "Leave request granted successfully".into(),
        leave_request,
    }))
}

/// POST /api/admin/leave-requests/{id}/deny
///
/// A non-blank `reason` is required and is shown to the student.
pub async fn deny_leave_request(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    input: Option<Json<DenyRequest>>,
) -> AppResult<Json<LeaveResponse>> {
    let input = input.map(|Json(body)| body).unwrap_or_default();
    let reason = normalize_reason(&input.reason, "Denial reason")?;

    let leave_request =
        process(&state, admin.user_id, id, LEAVE_STATUS_DENIED, Some(reason)).await?;
    Ok(Json(LeaveResponse {
        message: "Leave request denied successfully".into(),
        leave_request,
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_leave_request(state: &AppState, id: DbId) -> AppResult<LeaveRequest> {
    LeaveRequestRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "LeaveRequest",
            id,
        }))
}

/// Move a pending request to `status` and notify the student.
async fn process(
    state: &AppState,
    admin_id: DbId,
    id: DbId,
    status: &str,
    admin_response: Option<String>,
) -> AppResult<LeaveRequest> {
    let existing = find_leave_request(state, id).await?;
    ensure_pending(&existing.status)?;

    let input = ProcessLeaveRequest {
        status: status.to_string(),
        admin_response,
        processed_by: admin_id,
    };
    let leave_request = LeaveRequestRepo::process(&state.pool, id, &input)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation(
                "Leave request has already been processed".into(),
            ))
        })?;
    tracing::info!(leave_request_id = id, status, admin_id, "Leave request processed");

    if let Some(student) =
        StudentRepo::find_detail_by_id(&state.pool, leave_request.student_id).await?
    {
        state.event_bus.publish(
            HostelEvent::new(EVENT_LEAVE_PROCESSED)
                .with_source("leave_request", id)
                .with_actor(admin_id)
                .with_recipient(student.email, Some(student.name))
                .with_payload(json!({
                    "status": leave_request.status,
                    "admin_response": leave_request.admin_response,
                    "start_date": leave_request.start_date.to_string(),
                    "end_date": leave_request.end_date.to_string(),
                })),
        );
    }

    Ok(leave_request)
}
