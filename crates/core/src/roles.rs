//! Well-known role name constants.
//!
//! These must match the `ck_users_role` check constraint in
//! `20250101000001_create_users_table.sql`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_STUDENT: &str = "student";

/// All valid role values.
pub const VALID_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_STUDENT];

/// Whether `role` grants administrative access.
pub fn is_admin(role: &str) -> bool {
    role == ROLE_ADMIN
}
