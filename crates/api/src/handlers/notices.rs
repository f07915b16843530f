//! Handlers for the `/notices` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use hms_core::error::CoreError;
use hms_core::types::DbId;
use hms_db::models::notice::{CreateNotice, Notice, UpdateNotice};
use hms_db::repositories::NoticeRepo;
use hms_events::bus::EVENT_NOTICE_PUBLISHED;
use hms_events::HostelEvent;
use serde::Serialize;
use serde_json::json;

use super::required_text;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::MessageResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct NoticeResponse {
    pub message: String,
    pub notice: Notice,
}

/// GET /api/notices
///
/// Newest first.
pub async fn list_notices(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> AppResult<Json<Vec<Notice>>> {
    Ok(Json(NoticeRepo::list(&state.pool).await?))
}

/// POST /api/notices
///
/// Publishing queues an unviewed notification for every student.
pub async fn create_notice(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateNotice>,
) -> AppResult<(StatusCode, Json<NoticeResponse>)> {
    let input = CreateNotice {
        title: required_text(&input.title, "title")?,
        content: required_text(&input.content, "content")?,
    };

    let (notice, fanned_out) = NoticeRepo::create(&state.pool, admin.user_id, &input).await?;
    tracing::info!(notice_id = notice.id, fanned_out, "Notice published");

    state.event_bus.publish(
        HostelEvent::new(EVENT_NOTICE_PUBLISHED)
            .with_source("notice", notice.id)
            .with_actor(admin.user_id)
            .with_payload(json!({ "title": notice.title })),
    );

    Ok((
        StatusCode::CREATED,
        Json(NoticeResponse {
            message: "Notice created successfully".into(),
            notice,
        }),
    ))
}

/// PUT /api/notices/{id}
pub async fn update_notice(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateNotice>,
) -> AppResult<Json<NoticeResponse>> {
    let input = UpdateNotice {
        title: input
            .title
            .as_deref()
            .map(|t| required_text(t, "title"))
            .transpose()?,
        content: input
            .content
            .as_deref()
            .map(|c| required_text(c, "content"))
            .transpose()?,
    };

    let notice = NoticeRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Notice",
            id,
        }))?;

    Ok(Json(NoticeResponse {
        message: "Notice updated successfully".into(),
        notice,
    }))
}

/// DELETE /api/notices/{id}
pub async fn delete_notice(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    if !NoticeRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Notice",
            id,
        }));
    }
    Ok(Json(MessageResponse::new("Notice deleted successfully")))
}
