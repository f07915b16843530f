//! HTTP-level integration tests for leave requests.

mod common;

use axum::http::StatusCode;
use axum::Router;
use common::{
    body_json, create_admin, create_student, delete_auth, get_auth, post_json_auth, token_for,
};
use serde_json::json;
use sqlx::PgPool;

/// File a leave request in the far future and return its id.
async fn file_leave(app: Router, token: &str) -> i64 {
    let response = post_json_auth(
        app,
        "/api/student/leave-requests",
        token,
        json!({ "start_date": "2099-05-01", "end_date": "2099-05-04", "reason": "Family visit" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["leave_request"]["id"]
        .as_i64()
        .unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn filed_request_starts_pending(pool: PgPool) {
    let (user, _) = create_student(&pool, "Manav", "manav@campus.test").await;
    let app = common::build_test_app(pool);
    let token = token_for(&user);

    file_leave(app.clone(), &token).await;

    let list = body_json(get_auth(app, "/api/student/leave-requests", &token).await).await;
    assert_eq!(list[0]["status"], "Pending");
    assert_eq!(list[0]["reason"], "Family visit");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn end_before_start_is_rejected(pool: PgPool) {
    let (user, _) = create_student(&pool, "Neha", "neha@campus.test").await;
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app,
        "/api/student/leave-requests",
        &token_for(&user),
        json!({ "start_date": "2099-05-04", "end_date": "2099-05-01", "reason": "Trip" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deny_requires_a_reason(pool: PgPool) {
    let admin = create_admin(&pool).await;
    let (user, _) = create_student(&pool, "Ojas", "ojas@campus.test").await;
    let app = common::build_test_app(pool);
    let id = file_leave(app.clone(), &token_for(&user)).await;

    let response = post_json_auth(
        app,
        &format!("/api/admin/leave-requests/{id}/deny"),
        &token_for(&admin),
        json!({ "reason": "   " }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn denial_carries_the_admin_response(pool: PgPool) {
    let admin = create_admin(&pool).await;
    let (user, _) = create_student(&pool, "Pooja", "pooja@campus.test").await;
    let app = common::build_test_app(pool);
    let id = file_leave(app.clone(), &token_for(&user)).await;

    let response = post_json_auth(
        app,
        &format!("/api/admin/leave-requests/{id}/deny"),
        &token_for(&admin),
        json!({ "reason": "Exams that week" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["leave_request"]["status"], "Denied");
    assert_eq!(json["leave_request"]["admin_response"], "Exams that week");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn processed_request_cannot_be_processed_again(pool: PgPool) {
    let admin = create_admin(&pool).await;
    let (user, _) = create_student(&pool, "Qadir", "qadir@campus.test").await;
    let app = common::build_test_app(pool);
    let admin_token = token_for(&admin);
    let id = file_leave(app.clone(), &token_for(&user)).await;

    let uri = format!("/api/admin/leave-requests/{id}/grant");
    let response = post_json_auth(app.clone(), &uri, &admin_token, json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["leave_request"]["status"], "Granted");

    let response = post_json_auth(app, &uri, &admin_token, json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn only_the_owner_can_cancel(pool: PgPool) {
    let (owner, _) = create_student(&pool, "Rhea", "rhea@campus.test").await;
    let (other, _) = create_student(&pool, "Sahil", "sahil@campus.test").await;
    let app = common::build_test_app(pool);
    let id = file_leave(app.clone(), &token_for(&owner)).await;
    let uri = format!("/api/student/leave-requests/{id}");

    let response = delete_auth(app.clone(), &uri, &token_for(&other)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = delete_auth(app, &uri, &token_for(&owner)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_lists_requests_per_student(pool: PgPool) {
    let admin = create_admin(&pool).await;
    let (user, student) = create_student(&pool, "Tanvi", "tanvi@campus.test").await;
    let app = common::build_test_app(pool);
    file_leave(app.clone(), &token_for(&user)).await;

    let list = body_json(
        get_auth(
            app,
            &format!("/api/admin/students/{}/leave-requests", student.id),
            &token_for(&admin),
        )
        .await,
    )
    .await;

    assert_eq!(list.as_array().unwrap().len(), 1);
}
