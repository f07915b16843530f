//! Command set and reply parsing for the ZFM/R30x sensor family.

use serde::Serialize;

use crate::error::SensorError;

// ---------------------------------------------------------------------------
// Instruction codes
// ---------------------------------------------------------------------------

pub const CMD_GEN_IMAGE: u8 = 0x01;
pub const CMD_IMAGE_TO_TZ: u8 = 0x02;
pub const CMD_REG_MODEL: u8 = 0x05;
pub const CMD_UP_CHAR: u8 = 0x08;
pub const CMD_READ_SYS_PARA: u8 = 0x0F;
pub const CMD_VERIFY_PASSWORD: u8 = 0x13;
pub const CMD_TEMPLATE_NUM: u8 = 0x1D;

/// Character buffers available for feature extraction.
pub const CHAR_BUFFER_1: u8 = 0x01;
pub const CHAR_BUFFER_2: u8 = 0x02;

// ---------------------------------------------------------------------------
// Confirmation codes
// ---------------------------------------------------------------------------

pub const CONFIRM_OK: u8 = 0x00;
pub const CONFIRM_NO_FINGER: u8 = 0x02;

/// Human-readable meaning of a confirmation code.
pub fn describe_confirmation(code: u8) -> &'static str {
    match code {
        0x00 => "OK",
        0x01 => "Error receiving data packet",
        0x02 => "No finger on the sensor",
        0x03 => "Failed to capture fingerprint image",
        0x06 => "Fingerprint image too messy",
        0x07 => "Too few feature points in fingerprint image",
        0x0A => "Fingerprints do not match, could not combine",
        0x0D => "Error uploading template",
        0x0E => "Sensor cannot receive the following data packets",
        0x13 => "Wrong sensor password",
        0x15 => "No valid image in buffer",
        0x18 => "Error writing flash",
        0x1A => "Invalid register number",
        0x21 => "Sensor password must be verified first",
        _ => "Unknown sensor error",
    }
}

// ---------------------------------------------------------------------------
// Baud rates
// ---------------------------------------------------------------------------

/// Base unit of the sensor's baud rate setting (`N * 9600`).
pub const BAUD_UNIT: u32 = 9600;

/// Highest baud multiplier the sensor accepts.
pub const MAX_BAUD_MULTIPLIER: u32 = 12;

/// Factory default baud rate.
pub const DEFAULT_BAUDRATE: u32 = 57_600;

/// Reject baud rates the sensor cannot be configured for.
pub fn validate_baudrate(baudrate: u32) -> Result<(), SensorError> {
    let multiplier = baudrate / BAUD_UNIT;
    if baudrate % BAUD_UNIT == 0 && (1..=MAX_BAUD_MULTIPLIER).contains(&multiplier) {
        Ok(())
    } else {
        Err(SensorError::InvalidBaudrate(baudrate))
    }
}

// ---------------------------------------------------------------------------
// System parameters
// ---------------------------------------------------------------------------

/// Reply of `ReadSysPara`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SystemParameters {
    pub status_register: u16,
    pub system_id: u16,
    pub storage_capacity: u16,
    pub security_level: u16,
    pub device_address: u32,
    pub packet_size: u16,
    pub baudrate: u32,
}

impl SystemParameters {
    /// Number of parameter bytes after the confirmation code.
    pub const LEN: usize = 16;

    /// Parse the 16 parameter bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self, SensorError> {
        if bytes.len() < Self::LEN {
            return Err(SensorError::Protocol(format!(
                "system parameters too short: {} bytes",
                bytes.len()
            )));
        }
        let word = |i: usize| u16::from_be_bytes([bytes[i], bytes[i + 1]]);
        let packet_size = match word(12) {
            0 => 32,
            1 => 64,
            2 => 128,
            3 => 256,
            other => {
                return Err(SensorError::Protocol(format!(
                    "unknown packet size code {other}"
                )))
            }
        };
        Ok(Self {
            status_register: word(0),
            system_id: word(2),
            storage_capacity: word(4),
            security_level: word(6),
            device_address: u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            packet_size,
            baudrate: u32::from(word(14)) * BAUD_UNIT,
        })
    }
}
