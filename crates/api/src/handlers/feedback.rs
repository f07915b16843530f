//! Handlers for the `/feedback` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use hms_core::error::CoreError;
use hms_core::types::DbId;
use hms_db::models::feedback::{CreateFeedback, Feedback, UpdateFeedback, DEFAULT_RATING};
use hms_db::repositories::FeedbackRepo;
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::{MessageResponse, UpdatedResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /feedback`.
#[derive(Debug, Deserialize, Validate)]
pub struct FeedbackRequest {
    #[validate(length(min = 1, max = 2000, message = "Feedback content is required"))]
    pub content: String,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: Option<i32>,
}

/// Request body for `PUT /feedback/{id}`.
#[derive(Debug, Deserialize, Validate)]
pub struct FeedbackUpdateRequest {
    #[validate(length(min = 1, max = 2000, message = "Feedback content is required"))]
    pub content: Option<String>,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: Option<i32>,
}

/// Request body for `POST /feedback/mark-read`. No ids marks everything.
#[derive(Debug, Default, Deserialize)]
pub struct MarkReadRequest {
    #[serde(default)]
    pub ids: Vec<DbId>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/feedback
///
/// Admins see everything with unread entries first; users see their own.
pub async fn list_feedback(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<Feedback>>> {
    if auth.is_admin() {
        let mut feedback = FeedbackRepo::list(&state.pool, None).await?;
        feedback.sort_by_key(|f| f.is_read);
        Ok(Json(feedback))
    } else {
        Ok(Json(FeedbackRepo::list(&state.pool, Some(auth.user_id)).await?))
    }
}

/// POST /api/feedback
pub async fn create_feedback(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<FeedbackRequest>,
) -> AppResult<(StatusCode, Json<Feedback>)> {
    let input = FeedbackRequest {
        content: input.content.trim().to_string(),
        rating: input.rating,
    };
    input.validate()?;

    let feedback = FeedbackRepo::create(
        &state.pool,
        auth.user_id,
        &CreateFeedback {
            content: input.content,
            rating: Some(input.rating.unwrap_or(DEFAULT_RATING)),
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(feedback)))
}

/// PUT /api/feedback/{id}
pub async fn update_feedback(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<FeedbackUpdateRequest>,
) -> AppResult<Json<Feedback>> {
    let input = FeedbackUpdateRequest {
        content: input.content.map(|c| c.trim().to_string()),
        rating: input.rating,
    };
    input.validate()?;
    ensure_owner(&state, &auth, id).await?;

    let feedback = FeedbackRepo::update(
        &state.pool,
        id,
        &UpdateFeedback {
            content: input.content,
            rating: input.rating,
        },
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound {
        entity: "Feedback",
        id,
    }))?;
    Ok(Json(feedback))
}

/// DELETE /api/feedback/{id}
pub async fn delete_feedback(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    ensure_owner(&state, &auth, id).await?;
    FeedbackRepo::delete(&state.pool, id).await?;
    Ok(Json(MessageResponse::new("Feedback deleted successfully")))
}

/// POST /api/feedback/mark-read
pub async fn mark_read(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    input: Option<Json<MarkReadRequest>>,
) -> AppResult<Json<UpdatedResponse>> {
    let input = input.map(|Json(body)| body).unwrap_or_default();
    let count = FeedbackRepo::mark_read(&state.pool, &input.ids).await?;
    Ok(Json(UpdatedResponse {
        message: format!("{count} feedback entries marked as read"),
        count,
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn ensure_owner(state: &AppState, auth: &AuthUser, id: DbId) -> AppResult<()> {
    let feedback = FeedbackRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Feedback",
            id,
        }))?;
    if feedback.user_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "You can only modify your own feedback".into(),
        )));
    }
    Ok(())
}
