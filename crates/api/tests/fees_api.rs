//! HTTP-level integration tests for fee assignment and payment.

mod common;

use axum::http::StatusCode;
use common::{body_json, create_admin, create_student, get_auth, post_json_auth, token_for};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn bulk_assignment_skips_unknown_students(pool: PgPool) {
    let admin = create_admin(&pool).await;
    let (_, first) = create_student(&pool, "Deepa", "deepa@campus.test").await;
    let (_, second) = create_student(&pool, "Eshan", "eshan@campus.test").await;
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app,
        "/api/admin/fees",
        &token_for(&admin),
        json!({
            "student_ids": [first.id, second.id, 999_999],
            "description": "Mess charges",
            "amount": 2500.0,
            "due_date": "2099-01-31",
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["fees"].as_array().unwrap().len(), 2);
    assert_eq!(json["skipped_student_ids"], json!([999_999]));
    assert_eq!(json["fees"][0]["status"], "Pending");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn bulk_assignment_requires_students(pool: PgPool) {
    let admin = create_admin(&pool).await;
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app,
        "/api/admin/fees",
        &token_for(&admin),
        json!({ "student_ids": [], "description": "Laundry", "amount": 100.0 }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn negative_amount_is_rejected(pool: PgPool) {
    let admin = create_admin(&pool).await;
    let (_, student) = create_student(&pool, "Gopal", "gopal@campus.test").await;
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app,
        "/api/fees",
        &token_for(&admin),
        json!({ "student_id": student.id, "description": "Refund", "amount": -10.0 }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn past_due_fee_is_reported_overdue(pool: PgPool) {
    let admin = create_admin(&pool).await;
    let (user, student) = create_student(&pool, "Hema", "hema@campus.test").await;
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app.clone(),
        "/api/fees",
        &token_for(&admin),
        json!({
            "student_id": student.id,
            "description": "Hostel rent",
            "amount": 12000.0,
            "due_date": "2020-06-30",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let fees = body_json(get_auth(app, "/api/fees", &token_for(&user)).await).await;
    assert_eq!(fees[0]["status"], "Overdue");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn student_pays_own_fee_once(pool: PgPool) {
    let admin = create_admin(&pool).await;
    let (user, student) = create_student(&pool, "Isha", "isha@campus.test").await;
    let app = common::build_test_app(pool);
    let token = token_for(&user);

    let created = body_json(
        post_json_auth(
            app.clone(),
            "/api/fees",
            &token_for(&admin),
            json!({ "student_id": student.id, "description": "Hostel rent", "amount": 9000.0 }),
        )
        .await,
    )
    .await;
    let fee_id = created["id"].as_i64().unwrap();

    let response =
        post_json_auth(app.clone(), &format!("/api/fees/{fee_id}/pay"), &token, json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["fee"]["status"], "Paid");
    assert!(json["fee"]["payment_date"].is_string());

    let response = post_json_auth(app, &format!("/api/fees/{fee_id}/pay"), &token, json!({})).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn paying_someone_elses_fee_is_forbidden(pool: PgPool) {
    let admin = create_admin(&pool).await;
    let (_, owner) = create_student(&pool, "Jatin", "jatin@campus.test").await;
    let (other_user, _) = create_student(&pool, "Kavya", "kavya@campus.test").await;
    let app = common::build_test_app(pool);

    let created = body_json(
        post_json_auth(
            app.clone(),
            "/api/fees",
            &token_for(&admin),
            json!({ "student_id": owner.id, "description": "Hostel rent", "amount": 9000.0 }),
        )
        .await,
    )
    .await;
    let fee_id = created["id"].as_i64().unwrap();

    let response = post_json_auth(
        app,
        &format!("/api/fees/{fee_id}/pay"),
        &token_for(&other_user),
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn assigned_fee_appears_in_student_notifications(pool: PgPool) {
    let admin = create_admin(&pool).await;
    let (user, student) = create_student(&pool, "Lalit", "lalit@campus.test").await;
    let app = common::build_test_app(pool);

    post_json_auth(
        app.clone(),
        "/api/fees",
        &token_for(&admin),
        json!({ "student_id": student.id, "description": "Library", "amount": 300.0 }),
    )
    .await;

    let feed =
        body_json(get_auth(app, "/api/student/fee-notifications", &token_for(&user)).await).await;
    let entries = feed.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["title"], "New Fee: Library");
    assert_eq!(entries[0]["viewed_in_dashboard"], false);
}
