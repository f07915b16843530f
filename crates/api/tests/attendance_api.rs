//! HTTP-level integration tests for the attendance window and marking.

mod common;

use axum::http::StatusCode;
use axum::Router;
use common::{body_json, create_admin, create_student, get, get_auth, post_json_auth, token_for};
use serde_json::json;
use sqlx::PgPool;

async fn open_window(app: Router, admin_token: &str) {
    let response =
        post_json_auth(app, "/api/admin/attendance/window/open", admin_token, json!({})).await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

/// Enrol a right thumb template for `student_id`.
async fn store_fingerprint(app: Router, admin_token: &str, student_id: i64) {
    let response = post_json_auth(
        app,
        &format!("/api/admin/students/fingerprint/{student_id}"),
        admin_token,
        json!({ "right_thumb_template": "AAECAwQFBgcICQ==" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn window_opens_and_closes(pool: PgPool) {
    let admin = create_admin(&pool).await;
    let app = common::build_test_app(pool);
    let token = token_for(&admin);

    let status = body_json(get(app.clone(), "/api/attendance/window/status").await).await;
    assert_eq!(status["is_open"], false);

    open_window(app.clone(), &token).await;
    let status = body_json(get(app.clone(), "/api/attendance/window/status").await).await;
    assert_eq!(status["is_open"], true);

    let response =
        post_json_auth(app.clone(), "/api/admin/attendance/window/close", &token, json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["window"]["is_open"], false);
    assert_eq!(json["window"]["closed_by"], admin.id);

    let window = body_json(get_auth(app, "/api/admin/attendance/window", &token).await).await;
    assert_eq!(window["is_open"], false);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn closing_without_open_window_returns_404(pool: PgPool) {
    let admin = create_admin(&pool).await;
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app,
        "/api/admin/attendance/window/close",
        &token_for(&admin),
        json!({}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn self_mark_with_closed_window_is_forbidden(pool: PgPool) {
    let (user, _) = create_student(&pool, "Yash", "yash@campus.test").await;
    let app = common::build_test_app(pool);

    let response = post_json_auth(app, "/api/attendance", &token_for(&user), json!({})).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn self_mark_without_fingerprint_is_forbidden(pool: PgPool) {
    let admin = create_admin(&pool).await;
    let (user, _) = create_student(&pool, "Zoya", "zoya@campus.test").await;
    let app = common::build_test_app(pool);

    open_window(app.clone(), &token_for(&admin)).await;
    let response = post_json_auth(app, "/api/attendance", &token_for(&user), json!({})).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert!(json["message"].as_str().unwrap().contains("Fingerprint"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn self_mark_succeeds_once_per_day(pool: PgPool) {
    let admin = create_admin(&pool).await;
    let (user, student) = create_student(&pool, "Arjun", "arjun@campus.test").await;
    let app = common::build_test_app(pool);
    let admin_token = token_for(&admin);
    let token = token_for(&user);

    store_fingerprint(app.clone(), &admin_token, student.id).await;
    open_window(app.clone(), &admin_token).await;

    let response = post_json_auth(app.clone(), "/api/attendance", &token, json!({})).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["attendance"]["status"], "Present");

    let response = post_json_auth(app.clone(), "/api/attendance", &token, json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let history = body_json(get_auth(app, "/api/student/attendance", &token).await).await;
    assert_eq!(history.as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_mark_overwrites_existing_record(pool: PgPool) {
    let admin = create_admin(&pool).await;
    let (_, student) = create_student(&pool, "Bala", "bala@campus.test").await;
    let app = common::build_test_app(pool);
    let token = token_for(&admin);

    let body = json!({ "student_id": student.id, "status": "Absent", "date": "2026-01-05" });
    let response = post_json_auth(app.clone(), "/api/attendance", &token, body).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = json!({ "student_id": student.id, "status": "Present", "date": "2026-01-05" });
    let response = post_json_auth(app.clone(), "/api/attendance", &token, body).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["attendance"]["status"], "Present");

    let all = body_json(get_auth(app, "/api/attendance", &token).await).await;
    assert_eq!(all.as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_mark_rejects_unknown_status(pool: PgPool) {
    let admin = create_admin(&pool).await;
    let (_, student) = create_student(&pool, "Chetan", "chetan@campus.test").await;
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app,
        "/api/attendance",
        &token_for(&admin),
        json!({ "student_id": student.id, "status": "Late" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
