//! Route definitions for registration, login and password flows.

use axum::routing::post;
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Account routes mounted at the API root.
///
/// ```text
/// POST /register                    -> register (public)
/// POST /verify-otp                  -> verify_otp (public)
/// POST /resend-otp                  -> resend_otp (public)
/// POST /login                       -> login (public)
/// POST /forgot-password             -> forgot_password (public)
/// POST /verify-password-reset-otp   -> verify_password_reset_otp (public)
/// POST /reset-password              -> reset_password (reset token)
/// POST /change-password             -> change_password (requires auth)
/// ```
pub fn account_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/verify-otp", post(auth::verify_otp))
        .route("/resend-otp", post(auth::resend_otp))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route(
            "/verify-password-reset-otp",
            post(auth::verify_password_reset_otp),
        )
        .route("/reset-password", post(auth::reset_password))
        .route("/change-password", post(auth::change_password))
}

/// Session routes mounted at `/auth`.
///
/// ```text
/// POST /refresh  -> refresh
/// POST /logout   -> logout (requires auth)
/// ```
pub fn session_router() -> Router<AppState> {
    Router::new()
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
}
