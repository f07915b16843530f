//! Driver and connection management for the ZFM/R30x optical fingerprint
//! sensor used for biometric attendance enrollment.
//!
//! - [`packet`]: frame codec of the serial protocol.
//! - [`protocol`]: command codes, confirmation codes and parsed replies.
//! - [`driver`]: synchronous command driver over any `Read + Write` transport.
//! - [`transport`]: serial port access and port discovery.
//! - [`manager`]: [`SensorManager`], the shared handle owning the connection
//!   and the capture state machine.

pub mod backoff;
pub mod config;
pub mod driver;
pub mod error;
pub mod manager;
pub mod packet;
pub mod protocol;
pub mod transport;

#[cfg(test)]
pub(crate) mod mock;

pub use config::SensorConfig;
pub use error::SensorError;
pub use manager::{CaptureState, CapturedThumbs, InitOutcome, SensorManager, SensorStatus};
