//! Synchronous command driver.
//!
//! [`FingerprintDriver`] speaks the packet protocol over any blocking
//! `Read + Write` transport. Every call performs I/O and may block for the
//! transport's read timeout, so async callers run it on the blocking pool.

use std::io::{Read, Write};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::SensorError;
use crate::packet::{Packet, PacketKind};
use crate::protocol::{
    SystemParameters, CHAR_BUFFER_1, CHAR_BUFFER_2, CMD_GEN_IMAGE, CMD_IMAGE_TO_TZ,
    CMD_READ_SYS_PARA, CMD_REG_MODEL, CMD_TEMPLATE_NUM, CMD_UP_CHAR, CMD_VERIFY_PASSWORD,
    CONFIRM_NO_FINGER, CONFIRM_OK,
};

/// Upper bound on data frames accepted for one template upload.
const MAX_DATA_PACKETS: usize = 64;

/// Timing of the finger-detection polling loops.
#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    /// How long to wait for a finger to be placed or removed.
    pub finger_timeout: Duration,
    /// Pause between image capture attempts.
    pub poll_interval: Duration,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            finger_timeout: Duration::from_secs(15),
            poll_interval: Duration::from_millis(100),
        }
    }
}

pub struct FingerprintDriver<T> {
    transport: T,
    address: u32,
    password: u32,
}

impl<T: Read + Write> FingerprintDriver<T> {
    pub fn new(transport: T, address: u32, password: u32) -> Self {
        Self {
            transport,
            address,
            password,
        }
    }

    /// Give back the underlying transport.
    pub fn into_inner(self) -> T {
        self.transport
    }

    // ------------------------------------------------------------------
    // Framing
    // ------------------------------------------------------------------

    fn send_command(&mut self, payload: Vec<u8>) -> Result<(), SensorError> {
        Packet::new(self.address, PacketKind::Command, payload).write_to(&mut self.transport)
    }

    fn read_packet(&mut self) -> Result<Packet, SensorError> {
        Packet::read_from(&mut self.transport, self.address)
    }

    /// Send a command and return the confirmation code and remaining reply bytes.
    fn transact(&mut self, payload: Vec<u8>) -> Result<(u8, Vec<u8>), SensorError> {
        self.send_command(payload)?;
        let reply = self.read_packet()?;
        if reply.kind != PacketKind::Ack {
            return Err(SensorError::Protocol(format!(
                "expected acknowledgement, got {:?}",
                reply.kind
            )));
        }
        let mut payload = reply.payload;
        if payload.is_empty() {
            return Err(SensorError::Protocol("empty acknowledgement".into()));
        }
        let code = payload.remove(0);
        Ok((code, payload))
    }

    /// Send a command that must succeed and return the reply data.
    fn transact_ok(&mut self, payload: Vec<u8>) -> Result<Vec<u8>, SensorError> {
        match self.transact(payload)? {
            (CONFIRM_OK, data) => Ok(data),
            (code, _) => Err(SensorError::device(code)),
        }
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Authenticate with the module password. Required after power-up.
    pub fn verify_password(&mut self) -> Result<(), SensorError> {
        let mut payload = vec![CMD_VERIFY_PASSWORD];
        payload.extend_from_slice(&self.password.to_be_bytes());
        self.transact_ok(payload).map(|_| ())
    }

    pub fn system_parameters(&mut self) -> Result<SystemParameters, SensorError> {
        let data = self.transact_ok(vec![CMD_READ_SYS_PARA])?;
        SystemParameters::parse(&data)
    }

    /// Number of templates stored in the module's flash library.
    pub fn template_count(&mut self) -> Result<u16, SensorError> {
        let data = self.transact_ok(vec![CMD_TEMPLATE_NUM])?;
        match data.as_slice() {
            [hi, lo, ..] => Ok(u16::from_be_bytes([*hi, *lo])),
            _ => Err(SensorError::Protocol("template count reply too short".into())),
        }
    }

    /// Try to capture an image. `Ok(false)` means no finger was on the sensor.
    pub fn capture_image(&mut self) -> Result<bool, SensorError> {
        match self.transact(vec![CMD_GEN_IMAGE])? {
            (CONFIRM_OK, _) => Ok(true),
            (CONFIRM_NO_FINGER, _) => Ok(false),
            (code, _) => Err(SensorError::device(code)),
        }
    }

    /// Extract features of the captured image into `buffer`.
    pub fn image_to_characteristics(&mut self, buffer: u8) -> Result<(), SensorError> {
        self.transact_ok(vec![CMD_IMAGE_TO_TZ, buffer]).map(|_| ())
    }

    /// Combine both character buffers into a template (left in buffer 1).
    pub fn create_model(&mut self) -> Result<(), SensorError> {
        self.transact_ok(vec![CMD_REG_MODEL]).map(|_| ())
    }

    /// Download the contents of a character buffer.
    pub fn upload_characteristics(&mut self, buffer: u8) -> Result<Vec<u8>, SensorError> {
        self.transact_ok(vec![CMD_UP_CHAR, buffer])?;

        let mut template = Vec::new();
        for _ in 0..MAX_DATA_PACKETS {
            let packet = self.read_packet()?;
            match packet.kind {
                PacketKind::Data => template.extend_from_slice(&packet.payload),
                PacketKind::EndOfData => {
                    template.extend_from_slice(&packet.payload);
                    return Ok(template);
                }
                other => {
                    return Err(SensorError::Protocol(format!(
                        "unexpected {other:?} packet during upload"
                    )))
                }
            }
        }
        Err(SensorError::Protocol("template upload did not terminate".into()))
    }

    // ------------------------------------------------------------------
    // Finger handling
    // ------------------------------------------------------------------

    /// Poll until a finger is on the sensor and an image is captured.
    pub fn wait_for_finger(&mut self, options: &ScanOptions) -> Result<(), SensorError> {
        let started = Instant::now();
        loop {
            if self.capture_image()? {
                return Ok(());
            }
            if started.elapsed() >= options.finger_timeout {
                return Err(SensorError::Timeout("no finger placed on the sensor".into()));
            }
            thread::sleep(options.poll_interval);
        }
    }

    /// Poll until the sensor reports no finger.
    pub fn wait_for_removal(&mut self, options: &ScanOptions) -> Result<(), SensorError> {
        let started = Instant::now();
        loop {
            if !self.capture_image()? {
                return Ok(());
            }
            if started.elapsed() >= options.finger_timeout {
                return Err(SensorError::Timeout("finger was not removed from the sensor".into()));
            }
            thread::sleep(options.poll_interval);
        }
    }

    /// Scan one finger twice, build a template and download it.
    pub fn enroll_template(&mut self, options: &ScanOptions) -> Result<Vec<u8>, SensorError> {
        self.wait_for_finger(options)?;
        self.image_to_characteristics(CHAR_BUFFER_1)?;
        tracing::debug!("First scan stored, waiting for finger removal");

        self.wait_for_removal(options)?;
        self.wait_for_finger(options)?;
        self.image_to_characteristics(CHAR_BUFFER_2)?;

        self.create_model()?;
        self.upload_characteristics(CHAR_BUFFER_1)
    }
}

/// Lowercase hex encoding used to store templates as text.
pub fn encode_template(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::mock::{self, ScriptedTransport};
    use crate::packet::DEFAULT_ADDRESS;

    fn driver(replies: Vec<Packet>) -> FingerprintDriver<ScriptedTransport> {
        FingerprintDriver::new(ScriptedTransport::new(replies), DEFAULT_ADDRESS, 0)
    }

    fn fast() -> ScanOptions {
        ScanOptions {
            finger_timeout: Duration::from_secs(1),
            poll_interval: Duration::ZERO,
        }
    }

    #[test]
    fn handshake_reads_parameters_and_count() {
        let mut d = driver(mock::handshake(7));
        d.verify_password().unwrap();
        let params = d.system_parameters().unwrap();
        assert_eq!(params.storage_capacity, 1000);
        assert_eq!(d.template_count().unwrap(), 7);
        assert_eq!(
            d.into_inner().instructions(),
            vec![CMD_VERIFY_PASSWORD, CMD_READ_SYS_PARA, CMD_TEMPLATE_NUM]
        );
    }

    #[test]
    fn wrong_password_is_a_device_error() {
        let mut d = driver(vec![mock::ack(&[0x13])]);
        assert_matches!(d.verify_password(), Err(SensorError::Device { code: 0x13, .. }));
    }

    #[test]
    fn enrollment_uploads_template() {
        let template: Vec<u8> = (0u8..32).collect();
        let mut d = driver(mock::enrollment(&template));
        assert_eq!(d.enroll_template(&fast()).unwrap(), template);
        assert_eq!(
            d.into_inner().instructions(),
            vec![
                CMD_GEN_IMAGE,
                CMD_IMAGE_TO_TZ,
                CMD_GEN_IMAGE,
                CMD_GEN_IMAGE,
                CMD_IMAGE_TO_TZ,
                CMD_REG_MODEL,
                CMD_UP_CHAR
            ]
        );
    }

    #[test]
    fn waits_while_no_finger_present() {
        let mut d = driver(vec![mock::no_finger(), mock::no_finger(), mock::ok()]);
        d.wait_for_finger(&fast()).unwrap();
    }

    #[test]
    fn finger_wait_times_out() {
        let options = ScanOptions {
            finger_timeout: Duration::ZERO,
            poll_interval: Duration::ZERO,
        };
        let mut d = driver(vec![mock::no_finger()]);
        assert_matches!(d.wait_for_finger(&options), Err(SensorError::Timeout(_)));
    }

    #[test]
    fn mismatched_scans_fail_enrollment() {
        let mut d = driver(vec![
            mock::ok(),
            mock::ok(),
            mock::no_finger(),
            mock::ok(),
            mock::ok(),
            mock::ack(&[0x0A]),
        ]);
        assert_matches!(
            d.enroll_template(&fast()),
            Err(SensorError::Device { code: 0x0A, .. })
        );
    }

    #[test]
    fn silent_device_times_out() {
        let mut d = driver(vec![]);
        assert_matches!(d.template_count(), Err(SensorError::Timeout(_)));
    }

    #[test]
    fn templates_are_hex_encoded() {
        assert_eq!(encode_template(&[0x00, 0xAB, 0x10]), "00ab10");
    }
}
