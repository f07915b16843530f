//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod attendance_repo;
pub mod complaint_repo;
pub mod fee_notification_repo;
pub mod fee_repo;
pub mod feedback_repo;
pub mod fingerprint_repo;
pub mod leave_request_repo;
pub mod notice_repo;
pub mod notification_repo;
pub mod otp_repo;
pub mod room_repo;
pub mod session_repo;
pub mod student_repo;
pub mod user_repo;

pub use attendance_repo::{AttendanceRepo, AttendanceWindowRepo};
pub use complaint_repo::{ComplaintReplyRepo, ComplaintRepo};
pub use fee_notification_repo::FeeNotificationRepo;
pub use fee_repo::FeeRepo;
pub use feedback_repo::FeedbackRepo;
pub use fingerprint_repo::FingerprintRepo;
pub use leave_request_repo::LeaveRequestRepo;
pub use notice_repo::NoticeRepo;
pub use notification_repo::NotificationRepo;
pub use otp_repo::OtpRepo;
pub use room_repo::RoomRepo;
pub use session_repo::SessionRepo;
pub use student_repo::StudentRepo;
pub use user_repo::UserRepo;
