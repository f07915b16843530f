//! Handlers for student profiles and the admin enrollment queue.
//!
//! A student registers, completes the profile and submits an enrollment
//! request. An admin then approves the request into a room, rejects it, or
//! sends a decided student back to the pending queue. The allowed moves are
//! decided by `hms_core::enrollment`; this module only loads and persists.

use axum::extract::{Path, Query, State};
use axum::Json;
use hms_core::enrollment::{
    ensure_can_approve, ensure_can_mark_pending, ensure_can_reject, ensure_can_submit,
    restricted_fields_editable, validate_request_fields, EnrollmentFields,
};
use hms_core::error::CoreError;
use hms_core::profile::{normalize_contact_number, parse_date_of_birth, validate_semesters};
use hms_core::types::DbId;
use hms_db::models::student::{
    ApproveStudent, RoomAssignment, Student, StudentDetail, UpdateStudentProfile,
};
use hms_db::repositories::{FingerprintRepo, StudentRepo, UserRepo};
use hms_events::bus::{EVENT_STUDENT_APPROVED, EVENT_STUDENT_REJECTED};
use hms_events::HostelEvent;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{current_student, non_blank, today};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequireStudent};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `PUT/POST /student/profile`.
///
/// Every field is optional. Course, contact number, date of birth and
/// semesters are ignored while a request is awaiting review.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdateRequest {
    pub name: Option<String>,
    pub course: Option<String>,
    pub contact_number: Option<String>,
    pub date_of_birth: Option<String>,
    pub semesters_requested: Option<i32>,
    #[serde(default)]
    pub is_enrollment_requested: bool,
}

/// Request body for `PUT /admin/students/approve/{id}`.
#[derive(Debug, Default, Deserialize)]
pub struct ApproveRequest {
    pub room_id: Option<DbId>,
    pub course: Option<String>,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RoommatesQuery {
    pub room_id: Option<DbId>,
}

/// A student record plus an outcome message.
#[derive(Debug, Serialize)]
pub struct StudentResponse {
    pub message: String,
    pub student: StudentDetail,
}

/// The slice of a roommate's record other occupants may see.
#[derive(Debug, Serialize)]
pub struct Roommate {
    pub id: DbId,
    pub name: String,
    pub roll_number: String,
    pub profile_picture: Option<String>,
    pub course: Option<String>,
}

impl From<StudentDetail> for Roommate {
    fn from(s: StudentDetail) -> Self {
        Self {
            id: s.id,
            name: s.name,
            roll_number: s.roll_number,
            profile_picture: s.profile_picture,
            course: s.course,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FingerprintStatusResponse {
    pub has_fingerprint: bool,
    pub fingerprint_id: Option<DbId>,
}

// ---------------------------------------------------------------------------
// Admin handlers
// ---------------------------------------------------------------------------

/// GET /api/admin/students/pending
pub async fn list_pending(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<Vec<StudentDetail>>> {
    Ok(Json(StudentRepo::list_pending(&state.pool).await?))
}

/// GET /api/admin/students/approved
pub async fn list_approved(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<Vec<StudentDetail>>> {
    Ok(Json(StudentRepo::list_approved(&state.pool).await?))
}

/// PUT /api/admin/students/approve/{id}
///
/// Approve a pending student into a room, or move an approved student to
/// another room.
pub async fn approve_student(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(student_id): Path<DbId>,
    input: Option<Json<ApproveRequest>>,
) -> AppResult<Json<StudentResponse>> {
    let input = input.map(|Json(body)| body).unwrap_or_default();
    let room_id = input.room_id.ok_or_else(|| {
        AppError::BadRequest("Room assignment is required for approval".into())
    })?;

    let student = find_student(&state, student_id).await?;
    ensure_can_approve(student.enrollment_state())?;

    let approval = ApproveStudent {
        room_id,
        course: non_blank(input.course),
        profile_picture: non_blank(input.profile_picture),
    };
    match StudentRepo::approve(&state.pool, student_id, &approval).await? {
        RoomAssignment::Assigned(_) => {}
        RoomAssignment::InvalidState(current) => {
            // Changed after the check above; report it the same way.
            ensure_can_approve(current)?;
            return Err(AppError::Core(CoreError::Conflict(format!(
                "Student cannot be approved while {}",
                current.as_str()
            ))));
        }
        RoomAssignment::RoomNotFound => {
            return Err(AppError::BadRequest("Selected room does not exist".into()));
        }
        RoomAssignment::RoomFull {
            room_number,
            capacity,
            occupied,
        } => {
            return Err(AppError::Core(CoreError::Conflict(format!(
                "Room {room_number} is full (capacity: {capacity}, current: {occupied})"
            ))));
        }
    }

    let detail = find_detail(&state, student_id).await?;
    tracing::info!(student_id, room_id, admin_id = admin.user_id, "Student approved");
    state.event_bus.publish(
        HostelEvent::new(EVENT_STUDENT_APPROVED)
            .with_source("student", student_id)
            .with_actor(admin.user_id)
            .with_recipient(detail.email.clone(), Some(detail.name.clone()))
            .with_payload(json!({ "room_number": detail.room_number })),
    );

    Ok(Json(StudentResponse {
        message: "Student approved successfully".into(),
        student: detail,
    }))
}

/// PUT|DELETE /api/admin/students/reject/{id}
///
/// Clears the room assignment and the request flag; the account survives so
/// the student can resubmit.
pub async fn reject_student(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(student_id): Path<DbId>,
) -> AppResult<Json<StudentResponse>> {
    let student = find_student(&state, student_id).await?;
    ensure_can_reject(student.enrollment_state())?;

    StudentRepo::reject(&state.pool, student_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Student",
            id: student_id,
        }))?;

    let detail = find_detail(&state, student_id).await?;
    tracing::info!(student_id, admin_id = admin.user_id, "Student rejected");
    state.event_bus.publish(
        HostelEvent::new(EVENT_STUDENT_REJECTED)
            .with_source("student", student_id)
            .with_actor(admin.user_id)
            .with_recipient(detail.email.clone(), Some(detail.name.clone())),
    );

    Ok(Json(StudentResponse {
        message: "Student rejected successfully".into(),
        student: detail,
    }))
}

/// PUT /api/admin/students/mark-pending/{id}
pub async fn mark_pending(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(student_id): Path<DbId>,
) -> AppResult<Json<StudentResponse>> {
    let student = find_student(&state, student_id).await?;
    ensure_can_mark_pending(student.enrollment_state())?;

    StudentRepo::mark_pending(&state.pool, student_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Student",
            id: student_id,
        }))?;
    tracing::info!(student_id, admin_id = admin.user_id, "Student moved back to pending");

    Ok(Json(StudentResponse {
        message: "Student marked as pending".into(),
        student: find_detail(&state, student_id).await?,
    }))
}

// ---------------------------------------------------------------------------
// Student handlers
// ---------------------------------------------------------------------------

/// GET /api/student/profile
pub async fn get_profile(
    State(state): State<AppState>,
    RequireStudent(user): RequireStudent,
) -> AppResult<Json<StudentDetail>> {
    let student = current_student(&state, &user).await?;
    Ok(Json(find_detail(&state, student.id).await?))
}

/// PUT|POST /api/student/profile
///
/// Update profile fields and optionally submit the enrollment request.
pub async fn update_profile(
    State(state): State<AppState>,
    RequireStudent(user): RequireStudent,
    Json(input): Json<ProfileUpdateRequest>,
) -> AppResult<Json<StudentResponse>> {
    let student = current_student(&state, &user).await?;
    let enrollment = student.enrollment_state();

    let mut update = if restricted_fields_editable(enrollment) {
        restricted_changes(&input)?
    } else {
        UpdateStudentProfile::default()
    };

    if input.is_enrollment_requested {
        ensure_can_submit(enrollment)?;
        let course = update.course.as_deref().or(student.course.as_deref());
        let contact_number = update
            .contact_number
            .as_deref()
            .or(student.contact_number.as_deref());
        validate_request_fields(&EnrollmentFields {
            course,
            contact_number,
            has_date_of_birth: update.date_of_birth.or(student.date_of_birth).is_some(),
        })?;
        update.is_enrollment_requested = Some(true);
    }

    if let Some(name) = non_blank(input.name) {
        UserRepo::update_name(&state.pool, user.user_id, &name).await?;
    }

    StudentRepo::update_profile(&state.pool, student.id, &update)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Student",
            id: student.id,
        }))?;

    let message = if input.is_enrollment_requested {
        tracing::info!(student_id = student.id, "Enrollment request submitted");
        "Enrollment request submitted successfully"
    } else {
        "Profile updated successfully"
    };

    Ok(Json(StudentResponse {
        message: message.into(),
        student: find_detail(&state, student.id).await?,
    }))
}

/// GET /api/student/roommates?room_id=
///
/// Approved occupants of a room, excluding the caller.
pub async fn list_roommates(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<RoommatesQuery>,
) -> AppResult<Json<Vec<Roommate>>> {
    let room_id = query
        .room_id
        .ok_or_else(|| AppError::BadRequest("Room ID is required".into()))?;

    let exclude_id = StudentRepo::find_by_user_id(&state.pool, auth.user_id)
        .await?
        .map_or(0, |s| s.id);
    let roommates = StudentRepo::list_roommates(&state.pool, room_id, exclude_id).await?;

    Ok(Json(roommates.into_iter().map(Roommate::from).collect()))
}

/// GET /api/student/{id}
///
/// Admins may read any student; a student only their own record.
pub async fn get_student(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(student_id): Path<DbId>,
) -> AppResult<Json<StudentDetail>> {
    let detail = find_detail(&state, student_id).await?;
    if !auth.is_admin() && detail.user_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Unauthorized to access this student profile".into(),
        )));
    }
    Ok(Json(detail))
}

/// GET /api/student/fingerprint-status
pub async fn fingerprint_status(
    State(state): State<AppState>,
    RequireStudent(user): RequireStudent,
) -> AppResult<Json<FingerprintStatusResponse>> {
    let student = current_student(&state, &user).await?;
    let data = FingerprintRepo::find_by_student(&state.pool, student.id).await?;

    Ok(Json(FingerprintStatusResponse {
        has_fingerprint: data.is_some(),
        fingerprint_id: data.map(|d| d.id),
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_student(state: &AppState, id: DbId) -> AppResult<Student> {
    StudentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Student",
            id,
        }))
}

async fn find_detail(state: &AppState, id: DbId) -> AppResult<StudentDetail> {
    StudentRepo::find_detail_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Student",
            id,
        }))
}

/// Parse the restricted profile fields present in `input`.
fn restricted_changes(input: &ProfileUpdateRequest) -> AppResult<UpdateStudentProfile> {
    let course = input
        .course
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);
    let contact_number = input
        .contact_number
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .map(normalize_contact_number)
        .transpose()?;
    let date_of_birth = input
        .date_of_birth
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .map(|d| parse_date_of_birth(d, today()))
        .transpose()?;
    if let Some(semesters) = input.semesters_requested {
        validate_semesters(semesters)?;
    }

    Ok(UpdateStudentProfile {
        course,
        contact_number,
        date_of_birth,
        semesters_requested: input.semesters_requested,
        ..Default::default()
    })
}
