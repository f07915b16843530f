//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no server or
//! database is involved.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use hms_api::error::AppError;
use hms_core::error::CoreError;
use hms_sensor::SensorError;

/// Convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// ---------------------------------------------------------------------------
// Core errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::NotFound {
        entity: "Room",
        id: 42,
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["message"], "Room with id 42 not found");
}

#[tokio::test]
async fn validation_error_returns_400() {
    let err = AppError::Core(CoreError::Validation("Reason is required".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["message"], "Reason is required");
}

#[tokio::test]
async fn conflict_error_returns_409() {
    let err = AppError::Core(CoreError::Conflict("Email already registered".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
    assert_eq!(json["message"], "Email already registered");
}

#[tokio::test]
async fn unauthorized_error_returns_401() {
    let err = AppError::Core(CoreError::Unauthorized("Missing token".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn forbidden_error_returns_403() {
    let err = AppError::Core(CoreError::Forbidden("Admin access required".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");
    assert_eq!(json["message"], "Admin access required");
}

// ---------------------------------------------------------------------------
// HTTP-specific errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bad_request_error_returns_400() {
    let err = AppError::BadRequest("Room ID is required".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["message"], "Room ID is required");
}

#[tokio::test]
async fn message_not_found_returns_404() {
    let err = AppError::NotFound("No open attendance window".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "No open attendance window");
}

#[tokio::test]
async fn internal_error_returns_500_and_sanitizes_message() {
    let err = AppError::InternalError("smtp password rejected".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert!(!json.to_string().contains("smtp"));
    assert_eq!(json["message"], "An internal error occurred");
}

#[tokio::test]
async fn row_not_found_returns_404() {
    let (status, json) = error_to_response(AppError::Database(sqlx::Error::RowNotFound)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sensor_busy_returns_409() {
    let (status, json) = error_to_response(AppError::Sensor(SensorError::Busy)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["message"], "A fingerprint capture is already in progress");
}

#[tokio::test]
async fn sensor_not_connected_returns_503() {
    let (status, json) = error_to_response(AppError::Sensor(SensorError::NotConnected)).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["code"], "SENSOR_UNAVAILABLE");
}

#[tokio::test]
async fn sensor_timeout_returns_400() {
    let err = AppError::Sensor(SensorError::Timeout("no finger detected".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "SCAN_FAILED");
}

#[tokio::test]
async fn sensor_invalid_baudrate_returns_400() {
    let (status, json) =
        error_to_response(AppError::Sensor(SensorError::InvalidBaudrate(1234))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}
