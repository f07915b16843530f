//! JWT-based authentication extractors for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use hms_core::error::CoreError;
use hms_core::otp::PURPOSE_PASSWORD_RESET;
use hms_core::roles::is_admin;
use hms_core::types::DbId;

use crate::auth::jwt::{validate_token, Claims};
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from a JWT Bearer token in the `Authorization` header.
///
/// Purpose-restricted tokens (such as password reset tokens) are rejected.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
    /// The user's role name (`"admin"` or `"student"`).
    pub role: String,
    /// The e-mail address the token was issued to.
    pub email: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        is_admin(&self.role)
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, state)?;
        if claims.purpose.is_some() {
            return Err(AppError::Core(CoreError::Unauthorized(
                "Token cannot be used for this request".into(),
            )));
        }

        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
            email: claims.email,
        })
    }
}

/// The holder of a password reset token issued by OTP verification.
#[derive(Debug, Clone)]
pub struct PasswordResetUser {
    pub user_id: DbId,
}

impl FromRequestParts<AppState> for PasswordResetUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, state)?;
        if claims.purpose.as_deref() != Some(PURPOSE_PASSWORD_RESET) {
            return Err(AppError::BadRequest(
                "Invalid token for password reset".into(),
            ));
        }
        Ok(PasswordResetUser {
            user_id: claims.sub,
        })
    }
}

fn bearer_claims(parts: &Parts, state: &AppState) -> Result<Claims, AppError> {
    let auth_header = parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Missing Authorization header".into(),
            ))
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Core(CoreError::Unauthorized(
            "Invalid Authorization format. Expected: Bearer <token>".into(),
        ))
    })?;

    validate_token(token, &state.config.jwt)
        .map_err(|_| AppError::Core(CoreError::Unauthorized("Invalid or expired token".into())))
}
