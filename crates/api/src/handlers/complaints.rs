//! Handlers for complaints and their reply threads.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use hms_core::error::CoreError;
use hms_core::types::DbId;
use hms_db::models::complaint::{
    Complaint, ComplaintDetail, ComplaintReplyDetail, CreateComplaint, UpdateComplaint,
    VALID_COMPLAINT_STATUSES,
};
use hms_db::repositories::{ComplaintReplyRepo, ComplaintRepo, NotificationRepo};
use serde::{Deserialize, Serialize};

use super::required_text;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::MessageResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// A complaint together with its replies, oldest reply first.
#[derive(Debug, Serialize)]
pub struct ComplaintThread {
    #[serde(flatten)]
    pub complaint: ComplaintDetail,
    pub replies: Vec<ComplaintReplyDetail>,
}

/// Request body for creating or editing a reply.
#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    pub content: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/complaints
///
/// Admins see every complaint; other users see their own.
pub async fn list_complaints(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<ComplaintThread>>> {
    let owner = (!auth.is_admin()).then_some(auth.user_id);
    let complaints = ComplaintRepo::list(&state.pool, owner).await?;

    let ids: Vec<DbId> = complaints.iter().map(|c| c.id).collect();
    let mut replies: HashMap<DbId, Vec<ComplaintReplyDetail>> = HashMap::new();
    for reply in ComplaintReplyRepo::list_for_complaints(&state.pool, &ids).await? {
        replies.entry(reply.complaint_id).or_default().push(reply);
    }

    let threads = complaints
        .into_iter()
        .map(|complaint| ComplaintThread {
            replies: replies.remove(&complaint.id).unwrap_or_default(),
            complaint,
        })
        .collect();
    Ok(Json(threads))
}

/// POST /api/complaints
pub async fn create_complaint(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateComplaint>,
) -> AppResult<(StatusCode, Json<ComplaintDetail>)> {
    let input = CreateComplaint {
        subject: required_text(&input.subject, "subject")?,
        details: required_text(&input.details, "details")?,
    };

    let complaint = ComplaintRepo::create(&state.pool, auth.user_id, &input).await?;
    tracing::info!(complaint_id = complaint.id, user_id = auth.user_id, "Complaint filed");

    let detail = load_detail(&state, complaint.id).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// PUT /api/complaints/{id}
///
/// The owner may edit subject and details; only an admin may change status.
pub async fn update_complaint(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateComplaint>,
) -> AppResult<Json<ComplaintDetail>> {
    let complaint = load_complaint(&state, id).await?;
    ensure_owner_or_admin(&auth, &complaint)?;

    if let Some(status) = input.status.as_deref() {
        if !auth.is_admin() {
            return Err(AppError::Core(CoreError::Forbidden(
                "Only admins can change complaint status".into(),
            )));
        }
        if !VALID_COMPLAINT_STATUSES.contains(&status) {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Invalid status '{status}'. Must be one of: {}",
                VALID_COMPLAINT_STATUSES.join(", ")
            ))));
        }
    }

    let input = UpdateComplaint {
        subject: input
            .subject
            .as_deref()
            .map(|s| required_text(s, "subject"))
            .transpose()?,
        details: input
            .details
            .as_deref()
            .map(|d| required_text(d, "details"))
            .transpose()?,
        status: input.status,
    };
    ComplaintRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Complaint",
            id,
        }))?;

    Ok(Json(load_detail(&state, id).await?))
}

/// DELETE /api/complaints/{id}
pub async fn delete_complaint(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    let complaint = load_complaint(&state, id).await?;
    ensure_owner_or_admin(&auth, &complaint)?;

    ComplaintRepo::delete(&state.pool, id).await?;
    tracing::info!(complaint_id = id, user_id = auth.user_id, "Complaint deleted");
    Ok(Json(MessageResponse::new("Complaint deleted successfully")))
}

/// POST /api/complaints/{id}/replies
///
/// An admin replying to someone else's complaint queues a notification for
/// the complaint's author.
pub async fn create_reply(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<ReplyRequest>,
) -> AppResult<(StatusCode, Json<ComplaintReplyDetail>)> {
    let complaint = load_complaint(&state, id).await?;
    ensure_owner_or_admin(&auth, &complaint)?;
    let content = required_text(&input.content, "content")?;

    let reply =
        ComplaintReplyRepo::create(&state.pool, id, auth.user_id, &content, auth.is_admin())
            .await?;

    if auth.is_admin() && complaint.user_id != auth.user_id {
        NotificationRepo::create_complaint_notification(
            &state.pool,
            complaint.user_id,
            complaint.id,
            reply.id,
        )
        .await?;
    }

    let detail = load_reply_detail(&state, reply.id).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// PUT /api/complaints/{id}/replies/{reply_id}
pub async fn update_reply(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, reply_id)): Path<(DbId, DbId)>,
    Json(input): Json<ReplyRequest>,
) -> AppResult<Json<ComplaintReplyDetail>> {
    ensure_reply_editable(&state, &auth, id, reply_id).await?;
    let content = required_text(&input.content, "content")?;

    ComplaintReplyRepo::update_content(&state.pool, reply_id, &content)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Reply",
            id: reply_id,
        }))?;

    Ok(Json(load_reply_detail(&state, reply_id).await?))
}

/// DELETE /api/complaints/{id}/replies/{reply_id}
pub async fn delete_reply(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, reply_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<MessageResponse>> {
    ensure_reply_editable(&state, &auth, id, reply_id).await?;
    ComplaintReplyRepo::delete(&state.pool, reply_id).await?;
    Ok(Json(MessageResponse::new("Reply deleted successfully")))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn load_complaint(state: &AppState, id: DbId) -> AppResult<Complaint> {
    ComplaintRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Complaint",
            id,
        }))
}

async fn load_detail(state: &AppState, id: DbId) -> AppResult<ComplaintDetail> {
    ComplaintRepo::find_detail(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Complaint",
            id,
        }))
}

async fn load_reply_detail(state: &AppState, reply_id: DbId) -> AppResult<ComplaintReplyDetail> {
    ComplaintReplyRepo::find_detail(&state.pool, reply_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Reply",
            id: reply_id,
        }))
}

fn ensure_owner_or_admin(auth: &AuthUser, complaint: &Complaint) -> AppResult<()> {
    if complaint.user_id != auth.user_id && !auth.is_admin() {
        return Err(AppError::Core(CoreError::Forbidden(
            "You can only manage your own complaints".into(),
        )));
    }
    Ok(())
}

/// The reply must belong to the complaint and be authored by the caller
/// (admins may edit any reply).
async fn ensure_reply_editable(
    state: &AppState,
    auth: &AuthUser,
    complaint_id: DbId,
    reply_id: DbId,
) -> AppResult<()> {
    let reply = ComplaintReplyRepo::find(&state.pool, complaint_id, reply_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Reply",
            id: reply_id,
        }))?;
    if reply.user_id != auth.user_id && !auth.is_admin() {
        return Err(AppError::Core(CoreError::Forbidden(
            "You can only modify your own replies".into(),
        )));
    }
    Ok(())
}
