//! Route definitions for attendance records and the marking window.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::attendance;
use crate::state::AppState;

/// Routes mounted at `/attendance`.
///
/// ```text
/// GET  /                -> list_attendance
/// POST /                -> mark_attendance (admin: any, student: self)
/// GET  /window/status   -> window_status (public)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(attendance::list_attendance).post(attendance::mark_attendance),
        )
        .route("/window/status", get(attendance::window_status))
}

/// Admin window control mounted at `/admin/attendance`.
///
/// ```text
/// GET  /window         -> get_window
/// POST /window/open    -> open_window
/// POST /window/close   -> close_window
/// ```
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/window", get(attendance::get_window))
        .route("/window/open", post(attendance::open_window))
        .route("/window/close", post(attendance::close_window))
}
