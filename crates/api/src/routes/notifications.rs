//! Route definitions for notification badges.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::notifications;
use crate::state::AppState;

/// Routes mounted at `/notifications`.
///
/// ```text
/// GET  /complaint-replies/count         -> complaint_replies_count
/// POST /complaint-replies/mark-viewed   -> mark_complaint_replies_viewed (student)
/// GET  /new-complaints/count            -> new_complaints_count
/// POST /new-complaints/mark-viewed      -> mark_new_complaints_viewed (admin)
/// GET  /new-notices/count               -> new_notices_count
/// POST /new-notices/mark-viewed         -> mark_notices_viewed (student)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/complaint-replies/count",
            get(notifications::complaint_replies_count),
        )
        .route(
            "/complaint-replies/mark-viewed",
            post(notifications::mark_complaint_replies_viewed),
        )
        .route(
            "/new-complaints/count",
            get(notifications::new_complaints_count),
        )
        .route(
            "/new-complaints/mark-viewed",
            post(notifications::mark_new_complaints_viewed),
        )
        .route("/new-notices/count", get(notifications::new_notices_count))
        .route(
            "/new-notices/mark-viewed",
            post(notifications::mark_notices_viewed),
        )
}
