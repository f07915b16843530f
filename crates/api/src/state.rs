use std::sync::Arc;

use hms_events::EventBus;
use hms_sensor::SensorManager;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: hms_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// The fingerprint sensor shared by all admin consoles.
    pub sensor: SensorManager,
    /// Event bus feeding the e-mail notifier.
    pub event_bus: Arc<EventBus>,
}
