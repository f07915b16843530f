//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the central publish/subscribe hub for [`HostelEvent`]s.
//! It is shared via `Arc<EventBus>` across the application.

use chrono::{DateTime, Utc};
use hms_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// Registration code issued. Payload: `{"code", "expires_in_mins"}`.
pub const EVENT_REGISTRATION_OTP: &str = "auth.registration_otp";

/// Password reset code issued. Payload: `{"code", "expires_in_mins"}`.
pub const EVENT_PASSWORD_RESET_OTP: &str = "auth.password_reset_otp";

/// A password was changed or reset.
pub const EVENT_PASSWORD_CHANGED: &str = "auth.password_changed";

/// Admin approved an enrollment. Payload: `{"room_number"}`.
pub const EVENT_STUDENT_APPROVED: &str = "student.approved";

/// Admin rejected an enrollment.
pub const EVENT_STUDENT_REJECTED: &str = "student.rejected";

/// A fee was assigned. Payload: `{"description", "amount", "due_date"}`.
pub const EVENT_FEE_ASSIGNED: &str = "fee.assigned";

/// A leave request was granted or denied. Payload: `{"status", "admin_response"}`.
pub const EVENT_LEAVE_PROCESSED: &str = "leave.processed";

/// A notice was published. Payload: `{"title", "recipients"}`.
pub const EVENT_NOTICE_PUBLISHED: &str = "notice.published";

// ---------------------------------------------------------------------------
// HostelEvent
// ---------------------------------------------------------------------------

/// A domain event that occurred in the hostel service.
///
/// Constructed via [`HostelEvent::new`] and enriched with the builder
/// methods [`with_source`](HostelEvent::with_source),
/// [`with_actor`](HostelEvent::with_actor),
/// [`with_recipient`](HostelEvent::with_recipient) and
/// [`with_payload`](HostelEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostelEvent {
    /// Dot-separated event name, e.g. `"student.approved"`.
    pub event_type: String,

    /// Optional source entity kind (e.g. `"student"`, `"fee"`).
    pub source_entity_type: Option<String>,

    /// Optional source entity database id.
    pub source_entity_id: Option<DbId>,

    /// Optional id of the user that triggered the event.
    pub actor_user_id: Option<DbId>,

    /// E-mail address of the person the event concerns, if it should be mailed.
    pub recipient_email: Option<String>,

    /// Display name of the recipient, used in greetings.
    pub recipient_name: Option<String>,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl HostelEvent {
    /// Create a new event with only the required `event_type`.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            source_entity_type: None,
            source_entity_id: None,
            actor_user_id: None,
            recipient_email: None,
            recipient_name: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Attach a source entity to the event.
    pub fn with_source(mut self, entity_type: impl Into<String>, entity_id: DbId) -> Self {
        self.source_entity_type = Some(entity_type.into());
        self.source_entity_id = Some(entity_id);
        self
    }

    /// Attach the acting user to the event.
    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    /// Address the event to a person.
    pub fn with_recipient(mut self, email: impl Into<String>, name: Option<String>) -> Self {
        self.recipient_email = Some(email.into());
        self.recipient_name = name;
        self
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Read a string field from the payload.
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(serde_json::Value::as_str)
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`HostelEvent`].
///
/// ```rust
/// use hms_events::bus::{EventBus, HostelEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(HostelEvent::new("student.approved"));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<HostelEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: HostelEvent) {
        // A SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<HostelEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let event = HostelEvent::new(EVENT_STUDENT_APPROVED)
            .with_source("student", 42)
            .with_actor(7)
            .with_recipient("s@example.com", Some("Sam".into()))
            .with_payload(serde_json::json!({"room_number": "101"}));

        bus.publish(event);

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type, EVENT_STUDENT_APPROVED);
        assert_eq!(received.source_entity_type.as_deref(), Some("student"));
        assert_eq!(received.source_entity_id, Some(42));
        assert_eq!(received.actor_user_id, Some(7));
        assert_eq!(received.recipient_email.as_deref(), Some("s@example.com"));
        assert_eq!(received.payload_str("room_number"), Some("101"));
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(HostelEvent::new(EVENT_NOTICE_PUBLISHED));

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");

        assert_eq!(e1.event_type, EVENT_NOTICE_PUBLISHED);
        assert_eq!(e2.event_type, EVENT_NOTICE_PUBLISHED);
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(HostelEvent::new("orphan.event"));
    }

    #[test]
    fn default_event_has_empty_optional_fields() {
        let event = HostelEvent::new("bare.event");
        assert!(event.source_entity_type.is_none());
        assert!(event.actor_user_id.is_none());
        assert!(event.recipient_email.is_none());
        assert!(event.payload.is_object());
        assert_eq!(event.payload_str("missing"), None);
    }
}
