//! Route definitions for the admin console.
//!
//! Every handler here takes `RequireAdmin`, so non-admin callers get 403.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{fee_notifications, fees, fingerprint, leave, students};
use crate::state::AppState;

/// Student management mounted at `/admin/students`.
///
/// ```text
/// GET        /pending                          -> list_pending
/// GET        /approved                         -> list_approved
/// PUT        /approve/{id}                     -> approve_student
/// PUT|DELETE /reject/{id}                      -> reject_student
/// PUT        /mark-pending/{id}                -> mark_pending
/// GET        /fingerprint-status               -> fingerprint::list_status
/// POST       /fingerprint/{id}                 -> store_fingerprint
/// POST       /fingerprint/{id}/biometric-capture -> biometric_capture
/// GET        /{id}/leave-requests              -> leave::list_for_student
/// ```
pub fn students_router() -> Router<AppState> {
    Router::new()
        .route("/pending", get(students::list_pending))
        .route("/approved", get(students::list_approved))
        .route("/approve/{id}", put(students::approve_student))
        .route(
            "/reject/{id}",
            put(students::reject_student).delete(students::reject_student),
        )
        .route("/mark-pending/{id}", put(students::mark_pending))
        .route("/fingerprint-status", get(fingerprint::list_status))
        .route("/fingerprint/{id}", post(fingerprint::store_fingerprint))
        .route(
            "/fingerprint/{id}/biometric-capture",
            post(fingerprint::biometric_capture),
        )
        .route("/{id}/leave-requests", get(leave::list_for_student))
}

/// Sensor console mounted at `/admin/fingerprint`.
///
/// ```text
/// GET  /sensor/status       -> sensor_status
/// POST /sensor/initialize   -> initialize_sensor
/// POST /sensor/test-port    -> test_port
/// GET  /capture-status      -> capture_status
/// ```
pub fn fingerprint_router() -> Router<AppState> {
    Router::new()
        .route("/sensor/status", get(fingerprint::sensor_status))
        .route("/sensor/initialize", post(fingerprint::initialize_sensor))
        .route("/sensor/test-port", post(fingerprint::test_port))
        .route("/capture-status", get(fingerprint::capture_status))
}

/// Leave decisions mounted at `/admin/leave-requests`.
///
/// ```text
/// POST /{id}/grant   -> grant_leave_request
/// POST /{id}/deny    -> deny_leave_request
/// ```
pub fn leave_router() -> Router<AppState> {
    Router::new()
        .route("/{id}/grant", post(leave::grant_leave_request))
        .route("/{id}/deny", post(leave::deny_leave_request))
}

/// Fee administration mounted at `/admin`.
///
/// ```text
/// POST /fees                -> bulk_assign_fees
/// GET  /fee-notifications   -> list_all_grouped
/// ```
pub fn fees_router() -> Router<AppState> {
    Router::new()
        .route("/fees", post(fees::bulk_assign_fees))
        .route(
            "/fee-notifications",
            get(fee_notifications::list_all_grouped),
        )
}
