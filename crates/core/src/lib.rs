//! Domain rules shared by the HMS database, sensor and API crates.
//!
//! Everything in this crate is pure: no I/O, no database access. Handlers
//! load state, ask these modules what is allowed, then persist the result.

pub mod attendance;
pub mod enrollment;
pub mod error;
pub mod fees;
pub mod leave;
pub mod notifications;
pub mod otp;
pub mod profile;
pub mod roles;
pub mod rooms;
pub mod types;
pub mod uploads;
