//! Handlers for fingerprint enrollment and the sensor console.
//!
//! Templates reach the server either from an external capture client
//! (`POST /admin/students/fingerprint/{id}`) or from the sensor attached to
//! this host (`.../biometric-capture`). Sensor failures during a capture are
//! answered with `success: false` and an `error_type` the console can show.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hms_core::error::CoreError;
use hms_core::types::DbId;
use hms_db::models::fingerprint::{FingerprintStatusRow, FingerprintSummary, UpsertFingerprint};
use hms_db::repositories::{FingerprintRepo, StudentRepo};
use hms_sensor::protocol::DEFAULT_BAUDRATE;
use hms_sensor::{CaptureState, SensorError, SensorStatus};
use serde::{Deserialize, Serialize};

use super::non_blank;
use crate::error::{classify_sensor_error, AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /admin/students/fingerprint/{id}`.
///
/// `fingerprint_data` is the single-template form older capture clients
/// send; it is stored as the right thumb.
#[derive(Debug, Deserialize)]
pub struct StoreFingerprintRequest {
    pub fingerprint_data: Option<String>,
    pub right_thumb_template: Option<String>,
    pub left_thumb_template: Option<String>,
    pub device_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FingerprintResponse {
    pub message: String,
    pub fingerprint: FingerprintSummary,
}

#[derive(Debug, Serialize)]
pub struct CaptureResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<FingerprintSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct InitializeResponse {
    pub success: bool,
    pub message: String,
    pub sensor_info: SensorStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

/// Request body for `POST /admin/fingerprint/sensor/test-port`.
#[derive(Debug, Deserialize)]
pub struct TestPortRequest {
    pub port: Option<String>,
    pub baudrate: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct TestPortResponse {
    pub success: bool,
    pub message: String,
    pub port: String,
    pub baudrate: u32,
    pub sensor_info: SensorStatus,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/admin/students/fingerprint-status
pub async fn list_status(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<Vec<FingerprintStatusRow>>> {
    Ok(Json(FingerprintRepo::status_rows(&state.pool).await?))
}

/// POST /api/admin/students/fingerprint/{id}
///
/// Store templates captured elsewhere. 201 on first enrollment, 200 when
/// replacing existing data.
pub async fn store_fingerprint(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(student_id): Path<DbId>,
    Json(input): Json<StoreFingerprintRequest>,
) -> AppResult<(StatusCode, Json<FingerprintResponse>)> {
    ensure_student_exists(&state, student_id).await?;

    let right =
        non_blank(input.right_thumb_template).or_else(|| non_blank(input.fingerprint_data));
    let left = non_blank(input.left_thumb_template);
    if right.is_none() && left.is_none() {
        return Err(AppError::BadRequest("Fingerprint data is required".into()));
    }

    let upsert = UpsertFingerprint {
        right_thumb_template: right,
        left_thumb_template: left,
        device_id: non_blank(input.device_id),
    };
    let (data, inserted) = FingerprintRepo::upsert(&state.pool, student_id, &upsert).await?;
    tracing::info!(student_id, inserted, admin_id = admin.user_id, "Fingerprint stored");

    let (code, message) = stored_message(inserted);
    Ok((
        code,
        Json(FingerprintResponse {
            message: message.into(),
            fingerprint: FingerprintSummary::from(&data),
        }),
    ))
}

/// POST /api/admin/students/fingerprint/{id}/biometric-capture
///
/// Scan both thumbs on the attached sensor and store the templates.
///
/// The scan and the store run on their own task, so a client that gives up
/// (or a request timeout) does not lose a finished capture.
pub async fn biometric_capture(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(student_id): Path<DbId>,
) -> AppResult<Response> {
    ensure_student_exists(&state, student_id).await?;

    let sensor = state.sensor.clone();
    let pool = state.pool.clone();
    let admin_id = admin.user_id;
    let task = tokio::spawn(async move {
        let thumbs = match sensor.capture_both_thumbs(student_id).await {
            Ok(thumbs) => thumbs,
            Err(e) => return Ok(Err(e)),
        };
        let upsert = UpsertFingerprint {
            right_thumb_template: Some(thumbs.right_thumb),
            left_thumb_template: Some(thumbs.left_thumb),
            device_id: Some(thumbs.device_id),
        };
        let stored = FingerprintRepo::upsert(&pool, student_id, &upsert).await?;
        tracing::info!(student_id, inserted = stored.1, admin_id, "Biometric capture stored");
        Ok::<_, sqlx::Error>(Ok(stored))
    });

    let (data, inserted) = match task
        .await
        .map_err(|e| AppError::InternalError(format!("Capture task failed: {e}")))??
    {
        Ok(stored) => stored,
        Err(e) => return Ok(capture_failure(&e)),
    };

    let (code, message) = stored_message(inserted);
    Ok((
        code,
        Json(CaptureResponse {
            success: true,
            message: message.into(),
            fingerprint: Some(FingerprintSummary::from(&data)),
            error_type: None,
        }),
    )
        .into_response())
}

/// GET /api/admin/fingerprint/sensor/status
pub async fn sensor_status(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Json<SensorStatus> {
    Json(state.sensor.status().await)
}

/// POST /api/admin/fingerprint/sensor/initialize
///
/// Always 200; the outcome is in `success`.
pub async fn initialize_sensor(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Json<InitializeResponse> {
    let outcome = state.sensor.initialize().await;
    tracing::info!(success = outcome.success, admin_id = admin.user_id, "Sensor initialization");

    let suggestions = if outcome.success {
        Vec::new()
    } else {
        outcome.status.suggestions.clone()
    };
    Json(InitializeResponse {
        success: outcome.success,
        message: outcome.message,
        error_type: (!outcome.success).then_some("connection_failed"),
        suggestions,
        sensor_info: outcome.status,
    })
}

/// POST /api/admin/fingerprint/sensor/test-port
///
/// Probe a manually chosen port. A failing probe is reported with
/// `success: false`; only malformed input is an error.
pub async fn test_port(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<TestPortRequest>,
) -> AppResult<Json<TestPortResponse>> {
    let port = non_blank(input.port)
        .ok_or_else(|| AppError::BadRequest("Port is required".into()))?;
    let baudrate = input.baudrate.unwrap_or(DEFAULT_BAUDRATE);

    match state.sensor.test_port(port.clone(), baudrate).await {
        Ok(sensor_info) => Ok(Json(TestPortResponse {
            success: true,
            message: format!("Sensor responded on {port} at {baudrate} baud"),
            port,
            baudrate,
            sensor_info,
        })),
        Err(e @ SensorError::InvalidBaudrate(_)) => Err(e.into()),
        Err(e) => {
            tracing::warn!(port = %port, baudrate, error = %e, "Sensor port test failed");
            Ok(Json(TestPortResponse {
                success: false,
                message: e.to_string(),
                port,
                baudrate,
                sensor_info: state.sensor.status().await,
            }))
        }
    }
}

/// GET /api/admin/fingerprint/capture-status
pub async fn capture_status(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Json<CaptureState> {
    Json(state.sensor.capture_state())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn ensure_student_exists(state: &AppState, student_id: DbId) -> AppResult<()> {
    StudentRepo::find_by_id(&state.pool, student_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Student",
            id: student_id,
        }))?;
    Ok(())
}

fn stored_message(inserted: bool) -> (StatusCode, &'static str) {
    if inserted {
        (StatusCode::CREATED, "Fingerprint registered successfully")
    } else {
        (StatusCode::OK, "Fingerprint updated successfully")
    }
}

fn capture_failure(err: &SensorError) -> Response {
    let (status, code, message) = classify_sensor_error(err);
    let body = CaptureResponse {
        success: false,
        message,
        fingerprint: None,
        error_type: Some(code),
    };
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_dropped() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(Some(" ab01 ".into())).as_deref(), Some("ab01"));
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn busy_sensor_is_a_conflict() {
        let response = capture_failure(&SensorError::Busy);
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn missing_sensor_is_unavailable() {
        let response = capture_failure(&SensorError::NotConnected);
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
