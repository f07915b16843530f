//! Handlers for daily attendance and the attendance window.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use hms_core::attendance::{
    ensure_student_can_mark, validate_status, SelfMarkContext, ATTENDANCE_PRESENT,
};
use hms_core::error::CoreError;
use hms_core::profile::parse_date;
use hms_core::types::{DbId, Timestamp};
use hms_db::models::attendance::{Attendance, AttendanceDetail, AttendanceWindow};
use hms_db::repositories::{
    AttendanceRepo, AttendanceWindowRepo, FingerprintRepo, StudentRepo,
};
use serde::{Deserialize, Serialize};

use super::{current_student, today};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequireStudent};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /attendance`.
///
/// Students send an empty body to mark themselves present today. Admins
/// name the student and status, and optionally a date.
#[derive(Debug, Default, Deserialize)]
pub struct MarkAttendanceRequest {
    pub student_id: Option<DbId>,
    pub status: Option<String>,
    /// `YYYY-MM-DD`, defaults to today.
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AttendanceResponse {
    pub message: String,
    pub attendance: Attendance,
}

/// Current window state; all fields empty when no window was ever opened.
#[derive(Debug, Default, Serialize)]
pub struct WindowResponse {
    pub id: Option<DbId>,
    pub is_open: bool,
    pub opened_at: Option<Timestamp>,
    pub closed_at: Option<Timestamp>,
    pub opened_by: Option<DbId>,
    pub closed_by: Option<DbId>,
}

impl From<AttendanceWindow> for WindowResponse {
    fn from(window: AttendanceWindow) -> Self {
        Self {
            id: Some(window.id),
            is_open: window.is_open,
            opened_at: window.opened_at,
            closed_at: window.closed_at,
            opened_by: window.opened_by,
            closed_by: window.closed_by,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WindowStatus {
    pub is_open: bool,
}

#[derive(Debug, Serialize)]
pub struct WindowChangeResponse {
    pub message: String,
    pub window: WindowResponse,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/attendance
///
/// Admins see every record; students see their own.
pub async fn list_attendance(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<AttendanceDetail>>> {
    if auth.is_admin() {
        return Ok(Json(AttendanceRepo::list(&state.pool, None).await?));
    }
    match StudentRepo::find_by_user_id(&state.pool, auth.user_id).await? {
        Some(student) => Ok(Json(AttendanceRepo::list(&state.pool, Some(student.id)).await?)),
        None => Ok(Json(Vec::new())),
    }
}

/// POST /api/attendance
///
/// Students mark themselves present while the window is open; admins
/// record any status for any student and date (overwriting an existing
/// record).
pub async fn mark_attendance(
    State(state): State<AppState>,
    auth: AuthUser,
    input: Option<Json<MarkAttendanceRequest>>,
) -> AppResult<(StatusCode, Json<AttendanceResponse>)> {
    let input = input.map(|Json(body)| body).unwrap_or_default();
    if auth.is_admin() {
        admin_mark(&state, &auth, input).await
    } else {
        self_mark(&state, &auth).await
    }
}

/// GET /api/student/attendance
pub async fn student_attendance(
    State(state): State<AppState>,
    RequireStudent(auth): RequireStudent,
) -> AppResult<Json<Vec<AttendanceDetail>>> {
    let student = current_student(&state, &auth).await?;
    Ok(Json(AttendanceRepo::list(&state.pool, Some(student.id)).await?))
}

/// GET /api/attendance/window/status
///
/// Public so the student dashboard can poll it cheaply.
pub async fn window_status(State(state): State<AppState>) -> AppResult<Json<WindowStatus>> {
    let is_open = AttendanceWindowRepo::is_open(&state.pool).await?;
    Ok(Json(WindowStatus { is_open }))
}

/// GET /api/admin/attendance/window
pub async fn get_window(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<WindowResponse>> {
    let window = AttendanceWindowRepo::latest(&state.pool).await?;
    Ok(Json(window.map(WindowResponse::from).unwrap_or_default()))
}

/// POST /api/admin/attendance/window/open
///
/// Any window still open is closed first.
pub async fn open_window(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> AppResult<(StatusCode, Json<WindowChangeResponse>)> {
    let window = AttendanceWindowRepo::open(&state.pool, admin.user_id).await?;
    tracing::info!(window_id = window.id, admin_id = admin.user_id, "Attendance window opened");
    Ok((
        StatusCode::CREATED,
        Json(WindowChangeResponse {
            message: "Attendance window opened".into(),
            window: window.into(),
        }),
    ))
}

/// POST /api/admin/attendance/window/close
pub async fn close_window(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> AppResult<Json<WindowChangeResponse>> {
    let window = AttendanceWindowRepo::close(&state.pool, admin.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No open attendance window".into()))?;
    tracing::info!(window_id = window.id, admin_id = admin.user_id, "Attendance window closed");
    Ok(Json(WindowChangeResponse {
        message: "Attendance window closed".into(),
        window: window.into(),
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn self_mark(
    state: &AppState,
    auth: &AuthUser,
) -> AppResult<(StatusCode, Json<AttendanceResponse>)> {
    let student = current_student(state, auth).await?;
    let date = today();

    let ctx = SelfMarkContext {
        window_open: AttendanceWindowRepo::is_open(&state.pool).await?,
        has_fingerprint: FingerprintRepo::find_by_student(&state.pool, student.id)
            .await?
            .is_some(),
        already_marked_today: AttendanceRepo::find_for_date(&state.pool, student.id, date)
            .await?
            .is_some(),
    };
    ensure_student_can_mark(ctx)?;

    let attendance =
        AttendanceRepo::create_self(&state.pool, student.id, auth.user_id, date).await?;
    tracing::info!(student_id = student.id, %date, "Attendance self-marked");

    Ok((
        StatusCode::CREATED,
        Json(AttendanceResponse {
            message: format!("Attendance marked as {ATTENDANCE_PRESENT}"),
            attendance,
        }),
    ))
}

async fn admin_mark(
    state: &AppState,
    auth: &AuthUser,
    input: MarkAttendanceRequest,
) -> AppResult<(StatusCode, Json<AttendanceResponse>)> {
    let student_id = input
        .student_id
        .ok_or_else(|| AppError::BadRequest("student_id is required".into()))?;
    let status = input
        .status
        .ok_or_else(|| AppError::BadRequest("status is required".into()))?;
    validate_status(&status)?;
    let date = match input.date.as_deref().map(str::trim) {
        None | Some("") => today(),
        Some(value) => parse_date(value, "date")?,
    };

    StudentRepo::find_by_id(&state.pool, student_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Student",
            id: student_id,
        }))?;

    let existed = AttendanceRepo::find_for_date(&state.pool, student_id, date)
        .await?
        .is_some();
    let attendance =
        AttendanceRepo::upsert(&state.pool, student_id, date, &status, auth.user_id).await?;

    let (code, message) = if existed {
        (StatusCode::OK, "Attendance updated")
    } else {
        (StatusCode::CREATED, "Attendance recorded")
    };
    Ok((
        code,
        Json(AttendanceResponse {
            message: message.into(),
            attendance,
        }),
    ))
}
