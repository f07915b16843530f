//! Route definitions for the `/notices` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::notices;
use crate::state::AppState;

/// Routes mounted at `/notices`.
///
/// ```text
/// GET    /       -> list_notices
/// POST   /       -> create_notice (admin only)
/// PUT    /{id}   -> update_notice (admin only)
/// DELETE /{id}   -> delete_notice (admin only)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(notices::list_notices).post(notices::create_notice))
        .route(
            "/{id}",
            put(notices::update_notice).delete(notices::delete_notice),
        )
}
