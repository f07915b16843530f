//! Background service that mails events addressed to a person.
//!
//! [`EmailNotifier`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and, for every event with a recipient and a template, sends an e-mail.
//! Without SMTP configuration the message is logged and dropped. The loop
//! ends when the bus is dropped.

use tokio::sync::broadcast;

use crate::bus::HostelEvent;
use crate::delivery::email::EmailDelivery;
use crate::delivery::templates::{self, RenderedEmail};

/// Background service that e-mails hostel events.
pub struct EmailNotifier;

impl EmailNotifier {
    /// Run the notification loop until the bus closes.
    pub async fn run(
        delivery: Option<EmailDelivery>,
        mut receiver: broadcast::Receiver<HostelEvent>,
    ) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let Some((to, email)) = Self::prepare(&event) else {
                        continue;
                    };
                    match &delivery {
                        Some(delivery) => {
                            if let Err(e) = delivery.send(&to, &email).await {
                                tracing::error!(
                                    error = %e,
                                    to = %to,
                                    event_type = %event.event_type,
                                    "Failed to send notification email"
                                );
                            }
                        }
                        None => Self::log_undelivered(&to, &event.event_type, &email),
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Email notifier lagged, some emails were not sent");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, email notifier shutting down");
                    break;
                }
            }
        }
    }

    /// Without SMTP the message is only logged. The body goes out at `debug`
    /// so verification codes can still be read in a local setup.
    fn log_undelivered(to: &str, event_type: &str, email: &RenderedEmail) {
        tracing::info!(
            to,
            event_type,
            subject = %email.subject,
            "SMTP not configured, email skipped"
        );
        tracing::debug!(to, body = %email.html_body, "Undelivered email body");
    }

    /// Recipient and rendered message for `event`, if it should be mailed.
    fn prepare(event: &HostelEvent) -> Option<(String, RenderedEmail)> {
        let to = event.recipient_email.clone()?;
        let email = templates::render(event)?;
        Some((to, email))
    }
}
