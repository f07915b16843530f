//! Route definitions for uploaded files.

use axum::routing::get;
use axum::Router;

use crate::handlers::uploads;
use crate::state::AppState;

/// Routes mounted at `/uploads`.
///
/// ```text
/// GET /profile_pictures/{file}   -> serve_profile_picture (public)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/profile_pictures/{file}",
        get(uploads::serve_profile_picture),
    )
}
