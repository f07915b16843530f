//! Route definitions for fees and fee notifications.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{fee_notifications, fees};
use crate::state::AppState;

/// Routes mounted at `/fees`.
///
/// ```text
/// GET  /           -> list_fees (admin: all, student: own)
/// POST /           -> create_fee (admin only)
/// POST /{id}/pay   -> pay_fee (owning student)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(fees::list_fees).post(fees::create_fee))
        .route("/{id}/pay", post(fees::pay_fee))
}

/// Routes mounted at `/fee-notifications`.
///
/// ```text
/// POST /   -> send_fee_notifications (admin only)
/// ```
pub fn notification_router() -> Router<AppState> {
    Router::new().route("/", post(fee_notifications::send_fee_notifications))
}
