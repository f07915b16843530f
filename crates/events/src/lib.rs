//! Hostel event bus and e-mail notification infrastructure.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`HostelEvent`]: the domain event envelope published by handlers.
//! - [`EmailNotifier`]: background service that turns events addressed to a
//!   recipient into e-mails.
//! - [`delivery`]: the SMTP channel and message templates.

pub mod bus;
pub mod delivery;
pub mod notifier;

pub use bus::{EventBus, HostelEvent};
pub use delivery::email::{EmailConfig, EmailDelivery, EmailError};
pub use notifier::EmailNotifier;
