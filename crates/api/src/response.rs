//! Small response bodies shared across handlers.
//!
//! Payload-bearing responses are serialized bare (no envelope); these types
//! cover the acknowledgement shapes that many endpoints return.

use serde::Serialize;

/// `{ "message": "..." }` acknowledgement.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `{ "count": n }` counter used by the notification badges.
#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

/// `{ "message": "...", "count": n }` returned by bulk "mark as read" calls.
#[derive(Debug, Serialize)]
pub struct UpdatedResponse {
    pub message: String,
    pub count: u64,
}
