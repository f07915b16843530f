pub mod admin;
pub mod attendance;
pub mod auth;
pub mod complaints;
pub mod feedback;
pub mod fees;
pub mod health;
pub mod notices;
pub mod notifications;
pub mod rooms;
pub mod student;
pub mod uploads;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /register, /verify-otp, /resend-otp, /login         account (public)
/// /forgot-password, /verify-password-reset-otp        password reset (public)
/// /reset-password                                     reset token only
/// /change-password                                    requires auth
///
/// /auth/refresh                                       refresh (public)
/// /auth/logout                                        logout (requires auth)
///
/// /users                                              list (admin only)
/// /users/{id}                                         get (self or admin)
///
/// /rooms                                              list, create
/// /rooms/available                                    rooms with free beds (admin)
/// /rooms/{id}                                         update, delete (admin)
///
/// /complaints                                         list, create
/// /complaints/{id}                                    update, delete
/// /complaints/{id}/replies                            reply (POST)
/// /complaints/{id}/replies/{reply_id}                 update, delete
///
/// /fees                                               list, create (admin)
/// /fees/{id}/pay                                      pay (owning student)
/// /fee-notifications                                  send (admin, POST)
///
/// /notices                                            list, create (admin)
/// /notices/{id}                                       update, delete (admin)
///
/// /feedback                                           list, create
/// /feedback/mark-read                                 mark read (admin, POST)
/// /feedback/{id}                                      update, delete (author)
///
/// /attendance                                         list, mark
/// /attendance/window/status                           window open? (public)
///
/// /notifications/{badge}/count                        badge counters
/// /notifications/{badge}/mark-viewed                  clear badge (POST)
///
/// /student/...                                        student self-service
/// /uploads/profile_pictures/{file}                    profile pictures (public)
///
/// /admin/students/...                                 enrollment queue, fingerprints
/// /admin/fingerprint/...                              sensor console
/// /admin/attendance/window[/open|/close]              window control
/// /admin/leave-requests/{id}/grant|deny               leave decisions
/// /admin/fees                                         bulk fee assignment (POST)
/// /admin/fee-notifications                            grouped fee notifications
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Registration, login and password flows.
        .merge(auth::account_router())
        // Token refresh and logout.
        .nest("/auth", auth::session_router())
        .nest("/users", users::router())
        .nest("/rooms", rooms::router())
        .nest("/complaints", complaints::router())
        .nest("/fees", fees::router())
        .nest("/fee-notifications", fees::notification_router())
        .nest("/notices", notices::router())
        .nest("/feedback", feedback::router())
        .nest("/attendance", attendance::router())
        .nest("/notifications", notifications::router())
        // Student self-service.
        .nest("/student", student::router())
        // Public file serving.
        .nest("/uploads", uploads::router())
        // Admin console.
        .nest("/admin/students", admin::students_router())
        .nest("/admin/fingerprint", admin::fingerprint_router())
        .nest("/admin/attendance", attendance::admin_router())
        .nest("/admin/leave-requests", admin::leave_router())
        .nest("/admin", admin::fees_router())
}
