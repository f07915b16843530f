//! Errors raised while talking to the sensor.

use crate::protocol;

#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    /// Port could not be opened or an I/O call failed.
    #[error("Serial I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The device did not answer in time.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// A frame was malformed (bad header, address, checksum or length).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The device answered with a non-zero confirmation code.
    #[error("Sensor error 0x{code:02X}: {message}")]
    Device { code: u8, message: &'static str },

    /// No sensor connection is established.
    #[error("Fingerprint sensor is not connected")]
    NotConnected,

    /// A capture is already running.
    #[error("A fingerprint capture is already in progress")]
    Busy,

    /// The requested baud rate is not one the sensor supports.
    #[error("Invalid baud rate {0}. Must be a multiple of 9600 between 9600 and 115200")]
    InvalidBaudrate(u32),

    /// The blocking worker running the device call failed.
    #[error("Sensor task failed: {0}")]
    Task(String),

    /// The platform or port type is not supported.
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl SensorError {
    /// Build a [`SensorError::Device`] from a confirmation code.
    pub fn device(code: u8) -> Self {
        Self::Device {
            code,
            message: protocol::describe_confirmation(code),
        }
    }

    /// Whether the error means the link itself is broken and the
    /// connection should be dropped.
    pub fn is_link_failure(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Timeout(_) | Self::Protocol(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_error_carries_readable_message() {
        let err = SensorError::device(0x0A);
        assert_eq!(
            err.to_string(),
            "Sensor error 0x0A: Fingerprints do not match, could not combine"
        );
        assert!(!err.is_link_failure());
    }

    #[test]
    fn timeouts_are_link_failures() {
        assert!(SensorError::Timeout("read".into()).is_link_failure());
    }
}
