#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use hms_api::auth::jwt::{generate_access_token, JwtConfig};
use hms_api::auth::password::hash_password;
use hms_api::config::ServerConfig;
use hms_api::router::build_app_router;
use hms_api::state::AppState;
use hms_core::roles::{ROLE_ADMIN, ROLE_STUDENT};
use hms_db::models::student::Student;
use hms_db::models::user::{CreateUser, User};
use hms_db::repositories::{StudentRepo, UserRepo};
use hms_events::EventBus;
use hms_sensor::transport::{PortOpener, SerialIo};
use hms_sensor::{SensorConfig, SensorError, SensorManager};

pub const TEST_PASSWORD: &str = "hostel-pass-2024";

/// A port opener with no hardware behind it.
struct NoSensor;

impl PortOpener for NoSensor {
    fn open(&self, _port: &str, _baudrate: u32) -> Result<Box<dyn SerialIo>, SensorError> {
        Err(SensorError::NotConnected)
    }

    fn candidates(&self) -> Vec<String> {
        Vec::new()
    }
}

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "integration-test-secret-with-enough-bytes".to_string(),
        access_token_expiry_mins: 15,
        refresh_token_expiry_days: 7,
    }
}

/// Test configuration with a per-process upload directory.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        upload_dir: std::env::temp_dir()
            .join(format!("hms-test-uploads-{}", std::process::id())),
        room_capacity: 4,
        otp_expiry_mins: 10,
        admin_seed: None,
        jwt: test_jwt_config(),
    }
}

pub fn test_state(pool: PgPool) -> AppState {
    AppState {
        pool,
        config: Arc::new(test_config()),
        sensor: SensorManager::new(SensorConfig::default(), Arc::new(NoSensor)),
        event_bus: Arc::new(EventBus::default()),
    }
}

/// Build the application router with the production middleware stack.
pub fn build_test_app(pool: PgPool) -> Router {
    build_app_router(test_state(pool), &test_config())
}

/// Build the router around an existing state, e.g. to subscribe to its bus.
pub fn build_app_with_state(state: AppState) -> Router {
    let config = test_config();
    build_app_router(state, &config)
}

pub fn upload_dir() -> PathBuf {
    test_config().profile_picture_dir()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub async fn create_user(pool: &PgPool, name: &str, email: &str, role: &str) -> User {
    let input = CreateUser {
        name: name.to_string(),
        email: email.to_string(),
        password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
        role: role.to_string(),
    };
    UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed")
}

pub async fn create_admin(pool: &PgPool) -> User {
    create_user(pool, "Warden", "warden@hms.test", ROLE_ADMIN).await
}

/// A registered student with an empty profile.
pub async fn create_student(pool: &PgPool, name: &str, email: &str) -> (User, Student) {
    let user = create_user(pool, name, email, ROLE_STUDENT).await;
    let student = StudentRepo::create_for_user(pool, user.id)
        .await
        .expect("student creation should succeed");
    (user, student)
}

pub fn token_for(user: &User) -> String {
    generate_access_token(user.id, &user.role, &user.email, &test_jwt_config())
        .expect("token generation should succeed")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.expect("router is infallible")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("valid request");
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("valid request");
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    json_request(app, Method::POST, uri, None, body).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    json_request(app, Method::POST, uri, Some(token), body).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    json_request(app, Method::PUT, uri, Some(token), body).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("valid request");
    send(app, request).await
}

async fn json_request(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = builder
        .body(Body::from(body.to_string()))
        .expect("valid request");
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}
