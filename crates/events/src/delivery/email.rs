//! E-mail delivery via SMTP.
//!
//! [`EmailDelivery`] wraps the `lettre` async SMTP transport to send HTML
//! e-mails. Configuration is loaded from environment variables; if
//! `SMTP_HOST` is not set, [`EmailConfig::from_env`] returns `None` and no
//! mailer should be constructed.

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::templates::RenderedEmail;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for e-mail delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@hms.local";

/// Configuration for the SMTP delivery service.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    /// Optional SMTP username.
    pub smtp_user: Option<String>,
    /// Optional SMTP password.
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set, signalling that e-mail
    /// delivery is not configured and should be skipped.
    ///
    /// | Variable        | Required | Default              |
    /// |-----------------|----------|----------------------|
    /// | `SMTP_HOST`     | yes      | -                    |
    /// | `SMTP_PORT`     | no       | `587`                |
    /// | `SMTP_FROM`     | no       | `noreply@hms.local`  |
    /// | `SMTP_USER`     | no       | -                    |
    /// | `SMTP_PASSWORD` | no       | -                    |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// EmailDelivery
// ---------------------------------------------------------------------------

/// Sends rendered e-mails via SMTP.
pub struct EmailDelivery {
    config: EmailConfig,
}

impl EmailDelivery {
    /// Create a new delivery service with the given configuration.
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Build the MIME message for `email` addressed to `to_email`.
    pub fn build_message(&self, to_email: &str, email: &RenderedEmail) -> Result<Message, EmailError> {
        Message::builder()
            .from(self.config.from_address.parse()?)
            .to(to_email.parse()?)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(email.html_body.clone())
            .map_err(|e| EmailError::Build(e.to_string()))
    }

    /// Send `email` to `to_email`.
    pub async fn send(&self, to_email: &str, email: &RenderedEmail) -> Result<(), EmailError> {
        let message = self.build_message(to_email, email)?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
                .port(self.config.smtp_port);

        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let mailer = transport_builder.build();
        mailer.send(message).await?;

        tracing::info!(to = to_email, subject = %email.subject, "Notification email sent");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn delivery() -> EmailDelivery {
        EmailDelivery::new(EmailConfig {
            smtp_host: "localhost".into(),
            smtp_port: DEFAULT_SMTP_PORT,
            from_address: DEFAULT_FROM_ADDRESS.into(),
            smtp_user: None,
            smtp_password: None,
        })
    }

    fn rendered() -> RenderedEmail {
        RenderedEmail {
            subject: "HMS Test".into(),
            html_body: "<p>hi</p>".into(),
        }
    }

    #[test]
    fn builds_message_for_valid_address() {
        assert!(delivery().build_message("s@example.com", &rendered()).is_ok());
    }

    #[test]
    fn invalid_recipient_is_an_address_error() {
        let err = delivery().build_message("not-an-email", &rendered()).unwrap_err();
        assert!(err.to_string().contains("Email address parse error"));
    }

    #[test]
    fn email_error_display_build() {
        let err = EmailError::Build("missing body".to_string());
        assert_eq!(err.to_string(), "Email build error: missing body");
    }
}
