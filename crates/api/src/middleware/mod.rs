//! Authentication and authorization middleware extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`auth::PasswordResetUser`] -- Accepts only short-lived password reset tokens.
//! - [`rbac::RequireAdmin`] -- Requires the `admin` role.
//! - [`rbac::RequireStudent`] -- Requires the `student` role.

pub mod auth;
pub mod rbac;
