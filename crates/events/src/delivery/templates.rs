//! HTML e-mail bodies for the events that are mailed to a person.

use crate::bus::{
    HostelEvent, EVENT_FEE_ASSIGNED, EVENT_LEAVE_PROCESSED, EVENT_PASSWORD_CHANGED,
    EVENT_PASSWORD_RESET_OTP, EVENT_REGISTRATION_OTP, EVENT_STUDENT_APPROVED,
    EVENT_STUDENT_REJECTED,
};

/// Subject prefix of every message.
const SUBJECT_PREFIX: &str = "HMS";

/// A rendered message ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html_body: String,
}

/// Render `event` into an e-mail, or `None` if events of this type are not mailed.
pub fn render(event: &HostelEvent) -> Option<RenderedEmail> {
    let greeting = match event.recipient_name.as_deref() {
        Some(name) => format!("Hello {},", escape(name)),
        None => "Hello,".to_string(),
    };
    let expiry = event
        .payload
        .get("expires_in_mins")
        .and_then(serde_json::Value::as_i64)
        .unwrap_or(hms_core::otp::DEFAULT_OTP_EXPIRY_MINS);

    let (subject, heading, body) = match event.event_type.as_str() {
        EVENT_REGISTRATION_OTP => (
            "Email Verification",
            "Email Verification Code",
            format!(
                "<p>Thank you for registering with the Hostel Management System. \
                 Use the following code to verify your email address:</p>{}\
                 <p>This code will expire in {expiry} minutes.</p>\
                 <p>If you didn't request this email, please ignore it.</p>",
                code_block(event.payload_str("code")?)
            ),
        ),
        EVENT_PASSWORD_RESET_OTP => (
            "Password Reset",
            "Password Reset Verification Code",
            format!(
                "<p>You have requested to reset the password of your HMS account. \
                 Use the following code to verify your identity:</p>{}\
                 <p>This code will expire in {expiry} minutes.</p>\
                 <p><strong>If you didn't request a password reset, ignore this email \
                 and contact the hostel office.</strong></p>",
                code_block(event.payload_str("code")?)
            ),
        ),
        EVENT_PASSWORD_CHANGED => (
            "Password Changed",
            "Your password was changed",
            "<p>The password of your HMS account was just changed. \
             If this wasn't you, contact the hostel office immediately.</p>"
                .to_string(),
        ),
        EVENT_STUDENT_APPROVED => (
            "Enrollment Approved",
            "Enrollment Approved!",
            format!(
                "<p>Congratulations! Your enrollment request has been approved.</p>\
                 <p>Your room: <strong>{}</strong></p>\
                 <p>You now have full access to all hostel services.</p>",
                escape(event.payload_str("room_number").unwrap_or("to be announced"))
            ),
        ),
        EVENT_STUDENT_REJECTED => (
            "Enrollment Request Rejected",
            "Enrollment Request Rejected",
            "<p>Your enrollment request has been rejected. \
             You can update your profile and submit a new request.</p>"
                .to_string(),
        ),
        EVENT_FEE_ASSIGNED => (
            "New Fee",
            "A new fee has been assigned",
            format!(
                "<p>{}: <strong>{}</strong></p><p>Due date: {}</p>",
                escape(event.payload_str("description").unwrap_or("Hostel fee")),
                event
                    .payload
                    .get("amount")
                    .and_then(serde_json::Value::as_f64)
                    .map(|a| format!("{a:.2}"))
                    .unwrap_or_default(),
                escape(event.payload_str("due_date").unwrap_or("not set")),
            ),
        ),
        EVENT_LEAVE_PROCESSED => (
            "Leave Request Update",
            "Your leave request was processed",
            format!(
                "<p>Status: <strong>{}</strong></p>{}",
                escape(event.payload_str("status")?),
                event
                    .payload_str("admin_response")
                    .map(|r| format!("<p>Response: {}</p>", escape(r)))
                    .unwrap_or_default()
            ),
        ),
        _ => return None,
    };

    Some(RenderedEmail {
        subject: format!("{SUBJECT_PREFIX} {subject}"),
        html_body: wrap(heading, &greeting, &body),
    })
}

fn code_block(code: &str) -> String {
    format!(
        "<div style=\"text-align:center;margin:30px 0;font-size:32px;font-weight:bold;\
         letter-spacing:5px;\">{}</div>",
        escape(code)
    )
}

fn wrap(heading: &str, greeting: &str, body: &str) -> String {
    format!(
        "<div style=\"font-family:Arial,sans-serif;max-width:600px;margin:0 auto;padding:20px;\">\
         <h2 style=\"text-align:center;\">Hostel Management System</h2>\
         <h3>{heading}</h3><p>{greeting}</p>{body}</div>"
    )
}

/// Minimal HTML escaping for user-supplied text.
fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
