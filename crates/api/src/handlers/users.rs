//! Handlers for the `/users` resource.

use axum::extract::{Path, State};
use axum::Json;
use hms_core::error::CoreError;
use hms_core::types::DbId;
use hms_db::models::user::UserResponse;
use hms_db::repositories::UserRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

/// GET /api/users
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<Vec<UserResponse>>> {
    let users = UserRepo::list(&state.pool).await?;
    Ok(Json(users.iter().map(UserResponse::from).collect()))
}

/// GET /api/users/{id}
///
/// Users may read their own account; admins may read any.
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<UserResponse>> {
    if auth.user_id != id && !auth.is_admin() {
        return Err(AppError::Core(CoreError::Forbidden(
            "You can only view your own account".into(),
        )));
    }
    let user = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;
    Ok(Json(UserResponse::from(&user)))
}
