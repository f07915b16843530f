//! Route definitions for complaints and their reply threads.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::complaints;
use crate::state::AppState;

/// Routes mounted at `/complaints`.
///
/// ```text
/// GET    /                          -> list_complaints
/// POST   /                          -> create_complaint
/// PUT    /{id}                      -> update_complaint
/// DELETE /{id}                      -> delete_complaint
/// POST   /{id}/replies              -> create_reply
/// PUT    /{id}/replies/{reply_id}   -> update_reply
/// DELETE /{id}/replies/{reply_id}   -> delete_reply
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(complaints::list_complaints).post(complaints::create_complaint),
        )
        .route(
            "/{id}",
            put(complaints::update_complaint).delete(complaints::delete_complaint),
        )
        .route("/{id}/replies", post(complaints::create_reply))
        .route(
            "/{id}/replies/{reply_id}",
            put(complaints::update_reply).delete(complaints::delete_reply),
        )
}
