//! Route definitions for the student self-service area.

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use hms_core::uploads::MAX_PROFILE_PICTURE_BYTES;

use crate::handlers::{
    attendance, fee_notifications, leave, notifications, students, uploads,
};
use crate::state::AppState;

/// Room for multipart framing on top of the picture itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Routes mounted at `/student`.
///
/// ```text
/// GET      /profile                                 -> get_profile
/// PUT|POST /profile                                 -> update_profile
/// GET      /roommates?room_id=                      -> list_roommates
/// GET      /attendance                              -> student_attendance
/// GET      /fingerprint-status                      -> fingerprint_status
/// GET      /fee-notifications                       -> list_for_student
/// POST     /fee-notifications/mark-viewed-in-dashboard
///                                                   -> mark_viewed_in_dashboard
/// POST     /fee-notifications/{id}/read             -> mark_read
/// GET      /notifications                           -> list_student_notifications
/// POST     /notifications/{id}/read                 -> mark_student_notification_read
/// GET|POST /leave-requests                          -> list_own, create_leave_request
/// DELETE   /leave-requests/{id}                     -> delete_leave_request
/// POST     /upload-profile-picture                  -> upload_profile_picture (multipart)
/// GET      /{id}                                    -> get_student (self or admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            get(students::get_profile)
                .put(students::update_profile)
                .post(students::update_profile),
        )
        .route("/roommates", get(students::list_roommates))
        .route("/attendance", get(attendance::student_attendance))
        .route("/fingerprint-status", get(students::fingerprint_status))
        .route(
            "/fee-notifications",
            get(fee_notifications::list_for_student),
        )
        .route(
            "/fee-notifications/mark-viewed-in-dashboard",
            post(fee_notifications::mark_viewed_in_dashboard),
        )
        .route(
            "/fee-notifications/{id}/read",
            post(fee_notifications::mark_read),
        )
        .route(
            "/notifications",
            get(notifications::list_student_notifications),
        )
        .route(
            "/notifications/{id}/read",
            post(notifications::mark_student_notification_read),
        )
        .route(
            "/leave-requests",
            get(leave::list_own).post(leave::create_leave_request),
        )
        .route("/leave-requests/{id}", delete(leave::delete_leave_request))
        .route(
            "/upload-profile-picture",
            post(uploads::upload_profile_picture).layer(DefaultBodyLimit::max(
                MAX_PROFILE_PICTURE_BYTES + MULTIPART_OVERHEAD_BYTES,
            )),
        )
        .route("/{id}", get(students::get_student))
}
