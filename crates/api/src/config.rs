use std::path::PathBuf;

use hms_core::otp::DEFAULT_OTP_EXPIRY_MINS;
use hms_core::rooms::{validate_capacity, DEFAULT_ROOM_CAPACITY};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Time allowed for background services to drain after the listener stops.
    pub shutdown_timeout_secs: u64,
    /// Root directory for uploaded files (default: `uploads`).
    pub upload_dir: PathBuf,
    /// Capacity given to rooms created without one (default: `4`).
    pub room_capacity: i32,
    /// Lifetime of e-mailed verification codes, in minutes (default: `10`).
    pub otp_expiry_mins: i64,
    /// Administrator account created at startup when none exists.
    pub admin_seed: Option<AdminSeed>,
    /// JWT token configuration (secret, expiry durations).
    pub jwt: JwtConfig,
}

/// Credentials of the bootstrap administrator.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `5000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:3000`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    /// | `UPLOAD_DIR`           | `uploads`                  |
    /// | `ROOM_CAPACITY`        | `4`                        |
    /// | `OTP_EXPIRY_MINS`      | `10`                       |
    /// | `ADMIN_EMAIL`          | (no seeding)               |
    /// | `ADMIN_PASSWORD`       | (no seeding)               |
    /// | `ADMIN_NAME`           | `Administrator`            |
    ///
    /// # Panics
    ///
    /// Panics on unparsable numbers or an out-of-range `ROOM_CAPACITY`.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let upload_dir = PathBuf::from(
            std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".into()),
        );

        let room_capacity: i32 = std::env::var("ROOM_CAPACITY")
            .unwrap_or_else(|_| DEFAULT_ROOM_CAPACITY.to_string())
            .parse()
            .expect("ROOM_CAPACITY must be a valid i32");
        if let Err(e) = validate_capacity(room_capacity) {
            panic!("ROOM_CAPACITY is out of range: {e}");
        }

        let otp_expiry_mins: i64 = std::env::var("OTP_EXPIRY_MINS")
            .unwrap_or_else(|_| DEFAULT_OTP_EXPIRY_MINS.to_string())
            .parse()
            .expect("OTP_EXPIRY_MINS must be a valid i64");

        let admin_seed = match (
            std::env::var("ADMIN_EMAIL").ok().filter(|s| !s.is_empty()),
            std::env::var("ADMIN_PASSWORD").ok().filter(|s| !s.is_empty()),
        ) {
            (Some(email), Some(password)) => Some(AdminSeed {
                name: std::env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrator".into()),
                email,
                password,
            }),
            _ => None,
        };

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            upload_dir,
            room_capacity,
            otp_expiry_mins,
            admin_seed,
            jwt,
        }
    }

    /// Directory holding stored profile pictures.
    pub fn profile_picture_dir(&self) -> PathBuf {
        self.upload_dir.join(hms_core::uploads::PROFILE_PICTURE_DIR)
    }
}
