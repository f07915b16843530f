//! Sensor settings loaded from the environment.

use std::time::Duration;

use crate::backoff::RetryPolicy;
use crate::packet::DEFAULT_ADDRESS;
use crate::protocol::DEFAULT_BAUDRATE;

/// Default time allowed for placing or lifting a finger, in seconds.
const DEFAULT_FINGER_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone)]
pub struct SensorConfig {
    /// Preferred serial port; tried before discovered candidates.
    pub port: Option<String>,
    pub baudrate: u32,
    pub address: u32,
    pub password: u32,
    pub finger_timeout: Duration,
    pub poll_interval: Duration,
    /// Read timeout applied to the serial port.
    pub read_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            port: None,
            baudrate: DEFAULT_BAUDRATE,
            address: DEFAULT_ADDRESS,
            password: 0,
            finger_timeout: Duration::from_secs(DEFAULT_FINGER_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(100),
            read_timeout: Duration::from_secs(2),
            retry: RetryPolicy::default(),
        }
    }
}

impl SensorConfig {
    /// Load from environment variables, falling back to defaults.
    ///
    /// | Env var                           | Default      |
    /// |-----------------------------------|--------------|
    /// | `FINGERPRINT_PORT`                | (discover)   |
    /// | `FINGERPRINT_BAUDRATE`            | `57600`      |
    /// | `FINGERPRINT_ADDRESS`             | `FFFFFFFF`   |
    /// | `FINGERPRINT_PASSWORD`            | `0`          |
    /// | `FINGERPRINT_FINGER_TIMEOUT_SECS` | `15`         |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = std::env::var("FINGERPRINT_PORT")
            .ok()
            .filter(|p| !p.trim().is_empty());

        let baudrate: u32 = std::env::var("FINGERPRINT_BAUDRATE")
            .unwrap_or_else(|_| DEFAULT_BAUDRATE.to_string())
            .parse()
            .expect("FINGERPRINT_BAUDRATE must be a valid u32");

        let address = std::env::var("FINGERPRINT_ADDRESS")
            .ok()
            .map(|a| {
                u32::from_str_radix(a.trim_start_matches("0x"), 16)
                    .expect("FINGERPRINT_ADDRESS must be a hex u32")
            })
            .unwrap_or(defaults.address);

        let password: u32 = std::env::var("FINGERPRINT_PASSWORD")
            .unwrap_or_else(|_| "0".into())
            .parse()
            .expect("FINGERPRINT_PASSWORD must be a valid u32");

        let finger_timeout_secs: u64 = std::env::var("FINGERPRINT_FINGER_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_FINGER_TIMEOUT_SECS.to_string())
            .parse()
            .expect("FINGERPRINT_FINGER_TIMEOUT_SECS must be a valid u64");

        Self {
            port,
            baudrate,
            address,
            password,
            finger_timeout: Duration::from_secs(finger_timeout_secs),
            ..defaults
        }
    }
}
