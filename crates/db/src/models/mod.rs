//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - `Create*` / `Update*` DTOs consumed by the matching repository
//! - Joined read models where an endpoint needs data from several tables

pub mod attendance;
pub mod complaint;
pub mod fee;
pub mod feedback;
pub mod fingerprint;
pub mod leave_request;
pub mod notice;
pub mod notification;
pub mod otp;
pub mod room;
pub mod session;
pub mod student;
pub mod user;
