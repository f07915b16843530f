//! HTTP-level integration tests for the notification badge counters.

mod common;

use axum::http::StatusCode;
use axum::Router;
use common::{body_json, create_admin, create_student, get_auth, post_json_auth, token_for};
use serde_json::json;
use sqlx::PgPool;

async fn count(app: Router, uri: &str, token: &str) -> i64 {
    let response = get_auth(app, uri, token).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["count"].as_i64().unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn new_complaints_count_until_admin_marks_them_viewed(pool: PgPool) {
    let admin = token_for(&create_admin(&pool).await);
    let (user, _) = create_student(&pool, "Jai", "jai@campus.test").await;
    let student = token_for(&user);
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app.clone(),
        "/api/complaints",
        &student,
        json!({ "subject": "Fan broken", "details": "Ceiling fan in D-12 stopped" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    assert_eq!(count(app.clone(), "/api/notifications/new-complaints/count", &admin).await, 1);
    assert_eq!(count(app.clone(), "/api/notifications/new-complaints/count", &student).await, 0);

    let response = post_json_auth(
        app.clone(),
        "/api/notifications/new-complaints/mark-viewed",
        &admin,
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["count"], 1);

    assert_eq!(count(app, "/api/notifications/new-complaints/count", &admin).await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_reply_notifies_the_complaint_author(pool: PgPool) {
    let admin = token_for(&create_admin(&pool).await);
    let (user, _) = create_student(&pool, "Kiran", "kiran@campus.test").await;
    let student = token_for(&user);
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app.clone(),
        "/api/complaints",
        &student,
        json!({ "subject": "Leaking tap", "details": "Second floor washroom" }),
    )
    .await;
    let complaint_id = body_json(response).await["id"].as_i64().unwrap();

    // The author's own follow-up does not notify anyone.
    let response = post_json_auth(
        app.clone(),
        &format!("/api/complaints/{complaint_id}/replies"),
        &student,
        json!({ "content": "Still leaking" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(count(app.clone(), "/api/notifications/complaint-replies/count", &student).await, 0);

    let response = post_json_auth(
        app.clone(),
        &format!("/api/complaints/{complaint_id}/replies"),
        &admin,
        json!({ "content": "Plumber booked for tomorrow" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    assert_eq!(count(app.clone(), "/api/notifications/complaint-replies/count", &student).await, 1);
    assert_eq!(count(app.clone(), "/api/notifications/complaint-replies/count", &admin).await, 0);

    let response = post_json_auth(
        app.clone(),
        "/api/notifications/complaint-replies/mark-viewed",
        &admin,
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_json_auth(
        app.clone(),
        "/api/notifications/complaint-replies/mark-viewed",
        &student,
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(count(app, "/api/notifications/complaint-replies/count", &student).await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn published_notice_counts_for_every_student(pool: PgPool) {
    let admin = token_for(&create_admin(&pool).await);
    let (first, _) = create_student(&pool, "Lata", "lata@campus.test").await;
    let (second, _) = create_student(&pool, "Manu", "manu@campus.test").await;
    let (first, second) = (token_for(&first), token_for(&second));
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app.clone(),
        "/api/notices",
        &admin,
        json!({ "title": "Water supply", "content": "No water on Sunday 9-12" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    assert_eq!(count(app.clone(), "/api/notifications/new-notices/count", &first).await, 1);
    assert_eq!(count(app.clone(), "/api/notifications/new-notices/count", &second).await, 1);
    assert_eq!(count(app.clone(), "/api/notifications/new-notices/count", &admin).await, 0);

    let response = post_json_auth(
        app.clone(),
        "/api/notifications/new-notices/mark-viewed",
        &first,
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(count(app.clone(), "/api/notifications/new-notices/count", &first).await, 0);
    assert_eq!(count(app, "/api/notifications/new-notices/count", &second).await, 1);
}
