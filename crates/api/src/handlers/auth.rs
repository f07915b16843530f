//! Handlers for registration, login, sessions and password management.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use hms_core::enrollment::EnrollmentState;
use hms_core::error::CoreError;
use hms_core::otp::{
    self, PASSWORD_RESET_TOKEN_MINS, PURPOSE_PASSWORD_RESET, PURPOSE_REGISTRATION,
};
use hms_core::roles::{is_admin, ROLE_STUDENT};
use hms_core::types::DbId;
use hms_db::models::session::CreateSession;
use hms_db::models::student::StudentDetail;
use hms_db::models::user::{CreateUser, User, UserResponse};
use hms_db::repositories::{OtpRepo, SessionRepo, StudentRepo, UserRepo};
use hms_events::bus::{
    EVENT_PASSWORD_CHANGED, EVENT_PASSWORD_RESET_OTP, EVENT_REGISTRATION_OTP,
};
use hms_events::HostelEvent;
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use super::normalize_email;
use crate::auth::jwt::{
    generate_access_token, generate_purpose_token, generate_refresh_token, hash_refresh_token,
};
use crate::auth::password::{
    hash_password, validate_password_strength, verify_password, MIN_PASSWORD_LENGTH,
};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, PasswordResetUser};
use crate::response::MessageResponse;
use crate::state::AppState;

const INVALID_OTP: &str = "Invalid or expired OTP";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /register`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    pub password: String,
}

/// Request body for `POST /verify-otp`.
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    pub password: String,
    pub otp: String,
}

/// Request body for `POST /resend-otp`.
#[derive(Debug, Deserialize, Validate)]
pub struct ResendOtpRequest {
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    /// `registration` (default) or `password_reset`.
    pub purpose: Option<String>,
}

/// Request body for `POST /forgot-password`.
#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
}

/// Request body for `POST /verify-password-reset-otp`.
#[derive(Debug, Deserialize)]
pub struct VerifyResetOtpRequest {
    pub email: String,
    pub otp: String,
}

/// Request body for `POST /reset-password`.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
}

/// Request body for `POST /change-password`.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Request body for `POST /login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// `{ message, email }` returned once a code has been mailed.
#[derive(Debug, Serialize)]
pub struct OtpSentResponse {
    pub message: String,
    pub email: String,
}

/// Access and refresh tokens of a new session.
#[derive(Debug, Serialize)]
pub struct SessionTokens {
    pub token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// Response of login and OTP verification.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub tokens: SessionTokens,
    pub user: UserResponse,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
    #[serde(
        rename = "requiresProfileCompletion",
        skip_serializing_if = "Option::is_none"
    )]
    pub requires_profile_completion: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student: Option<StudentDetail>,
}

/// Response of `POST /verify-password-reset-otp`.
#[derive(Debug, Serialize)]
pub struct ResetTokenResponse {
    pub message: String,
    pub reset_token: String,
    pub expires_in: i64,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/register
///
/// Start a registration by e-mailing a verification code. The account is
/// created only once the code is verified.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> AppResult<Json<OtpSentResponse>> {
    input.validate()?;
    validate_password_strength(&input.password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let email = normalize_email(&input.email);
    ensure_email_available(&state, &email).await?;

    send_otp(&state, &email, PURPOSE_REGISTRATION, Some(input.name.trim())).await?;

    Ok(Json(OtpSentResponse {
        message: "OTP sent to your email. Please verify to complete registration.".into(),
        email,
    }))
}

/// POST /api/verify-otp
///
/// Verify the registration code, create the account and its student record,
/// and sign the new user in.
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(input): Json<VerifyOtpRequest>,
) -> AppResult<(StatusCode, Json<LoginResponse>)> {
    input.validate()?;
    validate_password_strength(&input.password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let email = normalize_email(&input.email);
    let code = input.otp.trim();
    if !otp::is_well_formed(code) {
        return Err(AppError::BadRequest(INVALID_OTP.into()));
    }
    ensure_email_available(&state, &email).await?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let account = CreateUser {
        name: input.name.trim().to_string(),
        email,
        password_hash,
        role: ROLE_STUDENT.to_string(),
    };
    let (user, student) = StudentRepo::register(&state.pool, &account, code)
        .await?
        .ok_or_else(|| AppError::BadRequest(INVALID_OTP.into()))?;
    let detail = StudentRepo::find_detail_by_id(&state.pool, student.id).await?;

    tracing::info!(user_id = user.id, student_id = student.id, "Student registered");

    let tokens = create_session(&state, &user).await?;
    Ok((
        StatusCode::CREATED,
        Json(LoginResponse {
            message: Some("Registration successful".into()),
            tokens,
            user: UserResponse::from(&user),
            is_admin: false,
            requires_profile_completion: Some(true),
            student: detail,
        }),
    ))
}

/// POST /api/resend-otp
pub async fn resend_otp(
    State(state): State<AppState>,
    Json(input): Json<ResendOtpRequest>,
) -> AppResult<Json<OtpSentResponse>> {
    input.validate()?;
    let email = normalize_email(&input.email);

    match input.purpose.as_deref().unwrap_or(PURPOSE_REGISTRATION) {
        PURPOSE_REGISTRATION => {
            ensure_email_available(&state, &email).await?;
            send_otp(&state, &email, PURPOSE_REGISTRATION, None).await?;
        }
        PURPOSE_PASSWORD_RESET => {
            // Unknown addresses get the same answer as known ones.
            if let Some(user) = UserRepo::find_by_email(&state.pool, &email).await? {
                send_otp(&state, &email, PURPOSE_PASSWORD_RESET, Some(&user.name)).await?;
            }
        }
        other => {
            return Err(AppError::BadRequest(format!("Unknown OTP purpose '{other}'")));
        }
    }

    Ok(Json(OtpSentResponse {
        message: "A new OTP has been sent to your email".into(),
        email,
    }))
}

/// POST /api/forgot-password
///
/// Always answers with the same message so callers cannot probe which
/// addresses are registered.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(input): Json<ForgotPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    input.validate()?;
    let email = normalize_email(&input.email);

    if let Some(user) = UserRepo::find_by_email(&state.pool, &email).await? {
        send_otp(&state, &email, PURPOSE_PASSWORD_RESET, Some(&user.name)).await?;
    } else {
        tracing::debug!("Password reset requested for unknown email");
    }

    Ok(Json(MessageResponse::new(
        "If the email is registered, a password reset OTP has been sent",
    )))
}

/// POST /api/verify-password-reset-otp
///
/// Exchange a password reset code for a short-lived reset token.
pub async fn verify_password_reset_otp(
    State(state): State<AppState>,
    Json(input): Json<VerifyResetOtpRequest>,
) -> AppResult<Json<ResetTokenResponse>> {
    let email = normalize_email(&input.email);
    let code = input.otp.trim();

    let user = UserRepo::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid OTP".into()))?;

    if !otp::is_well_formed(code)
        || !OtpRepo::consume(&state.pool, &email, PURPOSE_PASSWORD_RESET, code).await?
    {
        return Err(AppError::BadRequest(INVALID_OTP.into()));
    }

    let reset_token = generate_purpose_token(
        user.id,
        &user.role,
        &user.email,
        PURPOSE_PASSWORD_RESET,
        PASSWORD_RESET_TOKEN_MINS,
        &state.config.jwt,
    )
    .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    Ok(Json(ResetTokenResponse {
        message: "OTP verified. You can now reset your password.".into(),
        reset_token,
        expires_in: PASSWORD_RESET_TOKEN_MINS * 60,
    }))
}

/// POST /api/reset-password
///
/// Set a new password using a reset token. All sessions are revoked.
pub async fn reset_password(
    State(state): State<AppState>,
    reset: PasswordResetUser,
    Json(input): Json<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    validate_password_strength(&input.password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let user = find_user(&state, reset.user_id).await?;
    replace_password(&state, &user, &input.password).await?;

    Ok(Json(MessageResponse::new("Password has been reset successfully")))
}

/// POST /api/change-password
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let user = find_user(&state, auth.user_id).await?;

    let current_valid = verify_password(&input.current_password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !current_valid {
        return Err(AppError::BadRequest("Current password is incorrect".into()));
    }
    validate_password_strength(&input.new_password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    replace_password(&state, &user, &input.new_password).await?;

    Ok(Json(MessageResponse::new("Password changed successfully")))
}

/// POST /api/login
///
/// Authenticate with e-mail and password. A rejected student receives 403
/// with `registerAgain: true` so the client can offer a fresh registration.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Response> {
    let email = normalize_email(&input.email);

    let user = UserRepo::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Account not registered.".into()))
        })?;

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid credentials".into(),
        )));
    }

    if is_admin(&user.role) {
        let tokens = create_session(&state, &user).await?;
        tracing::info!(user_id = user.id, "Admin logged in");
        return Ok(Json(LoginResponse {
            message: None,
            tokens,
            user: UserResponse::from(&user),
            is_admin: true,
            requires_profile_completion: None,
            student: None,
        })
        .into_response());
    }

    let student = StudentRepo::find_detail_by_user_id(&state.pool, user.id)
        .await?
        .ok_or_else(|| {
            AppError::InternalError(format!("User {} has no student record", user.id))
        })?;

    let enrollment = student.enrollment_state();
    if enrollment == EnrollmentState::Rejected {
        tracing::info!(user_id = user.id, "Rejected student attempted login");
        let body = json!({
            "message": "You have been removed from the hostel.",
            "status": "rejected",
            "registerAgain": true,
        });
        return Ok((StatusCode::FORBIDDEN, Json(body)).into_response());
    }

    let tokens = create_session(&state, &user).await?;
    tracing::info!(user_id = user.id, student_id = student.id, "Student logged in");

    Ok(Json(LoginResponse {
        message: None,
        tokens,
        user: UserResponse::from(&user),
        is_admin: false,
        requires_profile_completion: Some(enrollment == EnrollmentState::Registered),
        student: Some(student),
    })
    .into_response())
}

/// POST /api/auth/refresh
///
/// Exchange a refresh token for a new token pair. The presented token is
/// used up.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<SessionTokens>> {
    let token_hash = hash_refresh_token(&input.refresh_token);

    let session = SessionRepo::consume(&state.pool, &token_hash)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid or expired refresh token".into(),
            ))
        })?;

    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

    Ok(Json(create_session(&state, &user).await?))
}

/// POST /api/auth/logout
///
/// Revoke all sessions for the authenticated user. Returns 204 No Content.
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> AppResult<StatusCode> {
    SessionRepo::revoke_all_for_user(&state.pool, auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn ensure_email_available(state: &AppState, email: &str) -> AppResult<()> {
    if UserRepo::find_by_email(&state.pool, email).await?.is_some() {
        return Err(AppError::Core(CoreError::Conflict(
            "Email already registered".into(),
        )));
    }
    Ok(())
}

async fn find_user(state: &AppState, user_id: DbId) -> AppResult<User> {
    UserRepo::find_by_id(&state.pool, user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user_id,
        }))
}

/// Store a fresh code for `email` and queue the e-mail carrying it.
async fn send_otp(
    state: &AppState,
    email: &str,
    purpose: &str,
    name: Option<&str>,
) -> AppResult<()> {
    let code = otp::generate_code();
    let expires_at = otp::expires_at(Utc::now(), state.config.otp_expiry_mins);
    let stored = OtpRepo::issue(&state.pool, email, purpose, &code, expires_at).await?;

    let event_type = if purpose == PURPOSE_PASSWORD_RESET {
        EVENT_PASSWORD_RESET_OTP
    } else {
        EVENT_REGISTRATION_OTP
    };
    state.event_bus.publish(
        HostelEvent::new(event_type)
            .with_source("otp_code", stored.id)
            .with_recipient(email, name.map(str::to_string))
            .with_payload(json!({
                "code": code,
                "expires_in_minutes": state.config.otp_expiry_mins,
            })),
    );

    tracing::info!(otp_id = stored.id, purpose, "OTP issued");
    Ok(())
}

/// Hash and store a new password, revoke every session and notify the owner.
async fn replace_password(state: &AppState, user: &User, password: &str) -> AppResult<()> {
    let password_hash = hash_password(password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    if !UserRepo::update_password(&state.pool, user.id, &password_hash).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user.id,
        }));
    }
    let revoked = SessionRepo::revoke_all_for_user(&state.pool, user.id).await?;
    tracing::info!(user_id = user.id, revoked, "Password replaced");

    state.event_bus.publish(
        HostelEvent::new(EVENT_PASSWORD_CHANGED)
            .with_source("user", user.id)
            .with_actor(user.id)
            .with_recipient(&user.email, Some(user.name.clone())),
    );
    Ok(())
}

/// Generate access + refresh tokens and persist a session row.
async fn create_session(state: &AppState, user: &User) -> AppResult<SessionTokens> {
    let token = generate_access_token(user.id, &user.role, &user.email, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let (refresh_plaintext, refresh_hash) = generate_refresh_token();
    let expires_at =
        Utc::now() + chrono::Duration::days(state.config.jwt.refresh_token_expiry_days);

    SessionRepo::create(
        &state.pool,
        &CreateSession {
            user_id: user.id,
            refresh_token_hash: refresh_hash,
            expires_at,
        },
    )
    .await?;

    Ok(SessionTokens {
        token,
        refresh_token: refresh_plaintext,
        expires_in: state.config.jwt.access_token_expiry_mins * 60,
    })
}
