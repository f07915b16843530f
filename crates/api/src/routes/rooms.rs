//! Route definitions for the `/rooms` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::rooms;
use crate::state::AppState;

/// Routes mounted at `/rooms`.
///
/// ```text
/// GET    /            -> list_rooms
/// POST   /            -> create_room (admin only)
/// GET    /available   -> list_available_rooms (admin only)
/// PUT    /{id}        -> update_room (admin only)
/// DELETE /{id}        -> delete_room (admin only)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(rooms::list_rooms).post(rooms::create_room))
        .route("/available", get(rooms::list_available_rooms))
        .route(
            "/{id}",
            put(rooms::update_room).delete(rooms::delete_room),
        )
}
