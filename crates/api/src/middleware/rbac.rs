//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose role does not
//! match. Use these in route handlers to enforce authorization at the type level.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use hms_core::error::CoreError;
use hms_core::roles::{ROLE_ADMIN, ROLE_STUDENT};

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `admin` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(admin): RequireAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != ROLE_ADMIN {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin access required".into(),
            )));
        }
        Ok(RequireAdmin(user))
    }
}

/// Requires the `student` role. Rejects with 403 Forbidden otherwise.
pub struct RequireStudent(pub AuthUser);

impl FromRequestParts<AppState> for RequireStudent {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != ROLE_STUDENT {
            return Err(AppError::Core(CoreError::Forbidden(
                "Student access required".into(),
            )));
        }
        Ok(RequireStudent(user))
    }
}
