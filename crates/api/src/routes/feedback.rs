//! Route definitions for the `/feedback` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::feedback;
use crate::state::AppState;

/// Routes mounted at `/feedback`.
///
/// ```text
/// GET    /            -> list_feedback
/// POST   /            -> create_feedback
/// POST   /mark-read   -> mark_read (admin only)
/// PUT    /{id}        -> update_feedback (author)
/// DELETE /{id}        -> delete_feedback (author)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(feedback::list_feedback).post(feedback::create_feedback),
        )
        .route("/mark-read", post(feedback::mark_read))
        .route(
            "/{id}",
            put(feedback::update_feedback).delete(feedback::delete_feedback),
        )
}
