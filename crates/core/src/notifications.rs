//! Notification kinds and the derived enrollment notices shown to students.
//!
//! Approval and rejection notices are not stored as rows. They are computed
//! from the student record every time the dashboard asks, and only their
//! read flag is persisted (as a `notification_states` row keyed by kind and
//! student id).

use chrono::Duration;
use serde::Serialize;

use crate::enrollment::STUDENT_STATUS_REJECTED;
use crate::types::{DbId, Timestamp};

/// Admin has seen a complaint (`entity_id` = complaint id).
pub const KIND_NEW_COMPLAINTS: &str = "new_complaints";

/// Student has seen a fee notification on the dashboard (`entity_id` = fee notification id).
pub const KIND_FEE_NOTIFICATION: &str = "fee_notification";

/// Student has read the approval notice (`entity_id` = student id).
pub const KIND_APPROVAL: &str = "approval";

/// Student has read the rejection notice (`entity_id` = student id).
pub const KIND_REJECTION: &str = "rejection";

/// Approval notices stay visible for this many days.
pub const APPROVAL_NOTICE_WINDOW_DAYS: i64 = 7;

/// Default `notification_type` of a fee notification row.
pub const FEE_NOTIFICATION_TYPE_PAYMENT: &str = "fee_payment";

/// A notice rendered on the student dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct StudentNotice {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub title: &'static str,
    pub message: &'static str,
    pub created_at: Timestamp,
    pub is_read: bool,
    pub importance: &'static str,
}

/// Enrollment facts needed to derive the notices.
#[derive(Debug, Clone)]
pub struct EnrollmentSnapshot<'a> {
    pub student_id: DbId,
    pub is_approved: bool,
    pub approval_date: Option<Timestamp>,
    pub status: &'a str,
    pub rejected_at: Option<Timestamp>,
}

/// Derive the notices for a student at time `now`.
///
/// `is_read(kind)` reports whether the student already read the notice of
/// that kind.
pub fn enrollment_notices(
    snapshot: &EnrollmentSnapshot<'_>,
    now: Timestamp,
    is_read: impl Fn(&str) -> bool,
) -> Vec<StudentNotice> {
    let mut notices = Vec::new();

    if snapshot.is_approved {
        if let Some(approved_at) = snapshot.approval_date {
            if now - approved_at <= Duration::days(APPROVAL_NOTICE_WINDOW_DAYS) {
                notices.push(StudentNotice {
                    id: notice_id(KIND_APPROVAL, snapshot.student_id),
                    kind: KIND_APPROVAL,
                    title: "Enrollment Approved!",
                    message: "Congratulations! Your enrollment request has been approved. \
                              You now have full access to all hostel services.",
                    created_at: approved_at,
                    is_read: is_read(KIND_APPROVAL),
                    importance: "high",
                });
            }
        }
    }

    if snapshot.status == STUDENT_STATUS_REJECTED {
        notices.push(StudentNotice {
            id: notice_id(KIND_REJECTION, snapshot.student_id),
            kind: KIND_REJECTION,
            title: "Enrollment Request Rejected",
            message: "Your enrollment request has been rejected. \
                      You can update your profile and submit a new request.",
            created_at: snapshot.rejected_at.unwrap_or(now),
            is_read: is_read(KIND_REJECTION),
            importance: "high",
        });
    }

    notices
}

/// Build the public id of a derived notice, e.g. `approval_12`.
pub fn notice_id(kind: &str, student_id: DbId) -> String {
    format!("{kind}_{student_id}")
}

/// Split a notice id back into its kind and student id.
pub fn parse_notice_id(id: &str) -> Option<(&'static str, DbId)> {
    let (kind, student) = id.rsplit_once('_')?;
    let kind = match kind {
        KIND_APPROVAL => KIND_APPROVAL,
        KIND_REJECTION => KIND_REJECTION,
        _ => return None,
    };
    let student_id = student.parse().ok()?;
    Some((kind, student_id))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::enrollment::STUDENT_STATUS_ACTIVE;

    fn snapshot(is_approved: bool, days_ago: Option<i64>, status: &str) -> EnrollmentSnapshot<'_> {
        EnrollmentSnapshot {
            student_id: 3,
            is_approved,
            approval_date: days_ago.map(|d| Utc::now() - Duration::days(d)),
            status,
            rejected_at: None,
        }
    }

    #[test]
    fn recent_approval_produces_notice() {
        let notices = enrollment_notices(&snapshot(true, Some(2), STUDENT_STATUS_ACTIVE), Utc::now(), |_| false);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].id, "approval_3");
        assert_eq!(notices[0].kind, KIND_APPROVAL);
        assert!(!notices[0].is_read);
    }

    #[test]
    fn old_approval_is_hidden() {
        let notices = enrollment_notices(&snapshot(true, Some(8), STUDENT_STATUS_ACTIVE), Utc::now(), |_| false);
        assert!(notices.is_empty());
    }

    #[test]
    fn rejection_produces_notice_with_read_flag() {
        let notices = enrollment_notices(
            &snapshot(false, None, STUDENT_STATUS_REJECTED),
            Utc::now(),
            |kind| kind == KIND_REJECTION,
        );
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].id, "rejection_3");
        assert!(notices[0].is_read);
    }

    #[test]
    fn pending_student_has_no_notices() {
        let notices = enrollment_notices(&snapshot(false, None, STUDENT_STATUS_ACTIVE), Utc::now(), |_| false);
        assert!(notices.is_empty());
    }

    #[test]
    fn notice_ids_round_trip() {
        assert_eq!(parse_notice_id("approval_42"), Some((KIND_APPROVAL, 42)));
        assert_eq!(parse_notice_id("rejection_7"), Some((KIND_REJECTION, 7)));
        assert_eq!(parse_notice_id("fee_7"), None);
        assert_eq!(parse_notice_id("approval_x"), None);
        assert_eq!(parse_notice_id("garbage"), None);
    }

    #[test]
    fn serialized_notice_uses_type_key() {
        let notices = enrollment_notices(&snapshot(true, Some(0), STUDENT_STATUS_ACTIVE), Utc::now(), |_| false);
        let json = serde_json::to_value(&notices[0]).unwrap();
        assert_eq!(json["type"], "approval");
        assert_eq!(json["importance"], "high");
    }
}
