//! External delivery channels for hostel notifications.
//!
//! Only e-mail is supported. [`templates`] renders an event into a message,
//! [`email`] ships it over SMTP.

pub mod email;
pub mod templates;
