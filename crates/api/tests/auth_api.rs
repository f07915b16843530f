//! HTTP-level integration tests for registration, login, sessions and
//! role enforcement.

mod common;

use axum::body::Body;
use axum::http::{Response, StatusCode};
use axum::Router;
use common::{
    body_json, create_admin, create_student, get, get_auth, post_json, post_json_auth,
    token_for, TEST_PASSWORD,
};
use hms_core::otp::MAX_OTP_ATTEMPTS;
use hms_events::bus::{EVENT_PASSWORD_RESET_OTP, EVENT_REGISTRATION_OTP};
use hms_events::HostelEvent;
use serde_json::json;
use sqlx::PgPool;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Wait for the next registration code published on the bus.
async fn next_registration_code(rx: &mut broadcast::Receiver<HostelEvent>) -> String {
    next_code(rx, EVENT_REGISTRATION_OTP).await
}

async fn next_code(rx: &mut broadcast::Receiver<HostelEvent>, event_type: &str) -> String {
    loop {
        let event = rx.recv().await.expect("event bus should stay open");
        if event.event_type == event_type {
            return event
                .payload_str("code")
                .expect("OTP event carries a code")
                .to_string();
        }
    }
}

async fn login(app: Router, email: &str, password: &str) -> Response<Body> {
    post_json(app, "/api/login", json!({ "email": email, "password": password })).await
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn register_then_verify_creates_student_and_signs_in(pool: PgPool) {
    let state = common::test_state(pool);
    let mut rx = state.event_bus.subscribe();
    let app = common::build_app_with_state(state);

    let response = post_json(
        app.clone(),
        "/api/register",
        json!({ "name": "Asha Rao", "email": "Asha@Campus.test", "password": TEST_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["email"], "asha@campus.test");

    let code = next_registration_code(&mut rx).await;

    let response = post_json(
        app,
        "/api/verify-otp",
        json!({
            "name": "Asha Rao",
            "email": "asha@campus.test",
            "password": TEST_PASSWORD,
            "otp": code,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert!(json["token"].is_string());
    assert!(json["refresh_token"].is_string());
    assert_eq!(json["isAdmin"], false);
    assert_eq!(json["requiresProfileCompletion"], true);
    assert_eq!(json["user"]["role"], "student");
    assert!(json["student"]["id"].is_number());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn verify_with_wrong_code_returns_400(pool: PgPool) {
    let state = common::test_state(pool);
    let mut rx = state.event_bus.subscribe();
    let app = common::build_app_with_state(state);

    post_json(
        app.clone(),
        "/api/register",
        json!({ "name": "Ben", "email": "ben@campus.test", "password": TEST_PASSWORD }),
    )
    .await;
    let code = next_registration_code(&mut rx).await;
    let wrong = if code == "000000" { "111111" } else { "000000" };

    let response = post_json(
        app,
        "/api/verify-otp",
        json!({
            "name": "Ben",
            "email": "ben@campus.test",
            "password": TEST_PASSWORD,
            "otp": wrong,
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Invalid or expired OTP");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn one_wrong_guess_still_allows_the_right_code(pool: PgPool) {
    let state = common::test_state(pool);
    let mut rx = state.event_bus.subscribe();
    let app = common::build_app_with_state(state);

    post_json(
        app.clone(),
        "/api/register",
        json!({ "name": "Esha", "email": "esha@campus.test", "password": TEST_PASSWORD }),
    )
    .await;
    let code = next_registration_code(&mut rx).await;
    let wrong = if code == "000000" { "111111" } else { "000000" };

    let body = |otp: &str| {
        json!({
            "name": "Esha",
            "email": "esha@campus.test",
            "password": TEST_PASSWORD,
            "otp": otp,
        })
    };
    let response = post_json(app.clone(), "/api/verify-otp", body(wrong)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(app, "/api/verify-otp", body(&code)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn reset_code_is_refused_after_too_many_wrong_guesses(pool: PgPool) {
    create_student(&pool, "Farah", "farah@campus.test").await;
    let state = common::test_state(pool);
    let mut rx = state.event_bus.subscribe();
    let app = common::build_app_with_state(state);

    let response = post_json(
        app.clone(),
        "/api/forgot-password",
        json!({ "email": "farah@campus.test" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let code = next_code(&mut rx, EVENT_PASSWORD_RESET_OTP).await;
    let wrong = if code == "000000" { "111111" } else { "000000" };

    for _ in 0..MAX_OTP_ATTEMPTS {
        let response = post_json(
            app.clone(),
            "/api/verify-password-reset-otp",
            json!({ "email": "farah@campus.test", "otp": wrong }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let response = post_json(
        app,
        "/api/verify-password-reset-otp",
        json!({ "email": "farah@campus.test", "otp": code }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Invalid or expired OTP");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn register_with_taken_email_returns_409(pool: PgPool) {
    create_student(&pool, "Chitra", "chitra@campus.test").await;
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        "/api/register",
        json!({ "name": "Chitra", "email": "CHITRA@campus.test", "password": TEST_PASSWORD }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn register_with_short_password_returns_400(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        "/api/register",
        json!({ "name": "Dev", "email": "dev@campus.test", "password": "abc" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_login_returns_tokens_and_admin_flag(pool: PgPool) {
    create_admin(&pool).await;
    let app = common::build_test_app(pool);

    let response = login(app, "warden@hms.test", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json["token"].is_string());
    assert_eq!(json["isAdmin"], true);
    assert!(json.get("student").is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn student_login_reports_profile_completion(pool: PgPool) {
    create_student(&pool, "Esha", "esha@campus.test").await;
    let app = common::build_test_app(pool);

    let response = login(app, "esha@campus.test", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["isAdmin"], false);
    assert_eq!(json["requiresProfileCompletion"], true);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_with_wrong_password_returns_401(pool: PgPool) {
    create_admin(&pool).await;
    let app = common::build_test_app(pool);

    let response = login(app, "warden@hms.test", "not-the-password").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_with_unknown_email_returns_401(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = login(app, "nobody@campus.test", TEST_PASSWORD).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Account not registered.");
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn refresh_rotates_the_refresh_token(pool: PgPool) {
    create_admin(&pool).await;
    let app = common::build_test_app(pool);

    let json = body_json(login(app.clone(), "warden@hms.test", TEST_PASSWORD).await).await;
    let refresh_token = json["refresh_token"].as_str().unwrap().to_string();

    let response = post_json(
        app.clone(),
        "/api/auth/refresh",
        json!({ "refresh_token": refresh_token }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let rotated = body_json(response).await;
    assert_ne!(rotated["refresh_token"], refresh_token.as_str());

    // The old token was revoked by the rotation.
    let response = post_json(
        app,
        "/api/auth/refresh",
        json!({ "refresh_token": refresh_token }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn logout_returns_204(pool: PgPool) {
    let admin = create_admin(&pool).await;
    let app = common::build_test_app(pool);

    let response = post_json_auth(app, "/api/auth/logout", &token_for(&admin), json!({})).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn change_password_rejects_wrong_current_password(pool: PgPool) {
    let (user, _) = create_student(&pool, "Farah", "farah@campus.test").await;
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app,
        "/api/change-password",
        &token_for(&user),
        json!({ "current_password": "wrong-one", "new_password": "brand-new-pass" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Current password is incorrect");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn forgot_password_answers_the_same_for_unknown_email(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        "/api/forgot-password",
        json!({ "email": "ghost@campus.test" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Role enforcement
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_token_returns_401(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(app, "/api/admin/students/pending").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn garbage_token_returns_401(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get_auth(app, "/api/admin/students/pending", "not-a-jwt").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn student_on_admin_route_returns_403(pool: PgPool) {
    let (user, _) = create_student(&pool, "Gita", "gita@campus.test").await;
    let app = common::build_test_app(pool);

    let response = get_auth(app, "/api/admin/students/pending", &token_for(&user)).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_on_student_route_returns_403(pool: PgPool) {
    let admin = create_admin(&pool).await;
    let app = common::build_test_app(pool);

    let response = get_auth(app, "/api/student/leave-requests", &token_for(&admin)).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
