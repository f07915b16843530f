//! Serial port access and candidate discovery.
//!
//! [`PortOpener`] is the seam between the [`SensorManager`](crate::SensorManager)
//! and real hardware. [`SerialPortOpener`] configures a tty in raw 8N1 mode
//! through termios on unix platforms.

use std::io::{Read, Write};
use std::time::Duration;

use crate::error::SensorError;

/// A bidirectional byte stream to the sensor.
pub trait SerialIo: Read + Write + Send {}

impl<T: Read + Write + Send> SerialIo for T {}

/// Opens sensor ports and lists where a sensor might be attached.
pub trait PortOpener: Send + Sync {
    fn open(&self, port: &str, baudrate: u32) -> Result<Box<dyn SerialIo>, SensorError>;

    /// Device paths worth probing, most likely first.
    fn candidates(&self) -> Vec<String>;
}

/// Prefixes of `/dev` entries created by USB serial adapters.
const USB_SERIAL_PREFIXES: &[&str] = &["ttyUSB", "ttyACM"];

/// On-board UART probed last.
const ONBOARD_UART: &str = "/dev/ttyS0";

/// Opens real serial ports.
#[derive(Debug, Clone)]
pub struct SerialPortOpener {
    read_timeout: Duration,
}

impl SerialPortOpener {
    pub fn new(read_timeout: Duration) -> Self {
        Self { read_timeout }
    }
}

impl PortOpener for SerialPortOpener {
    fn open(&self, port: &str, baudrate: u32) -> Result<Box<dyn SerialIo>, SensorError> {
        Ok(Box::new(open_serial(port, baudrate, self.read_timeout)?))
    }

    fn candidates(&self) -> Vec<String> {
        let mut found: Vec<String> = std::fs::read_dir("/dev")
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .filter_map(|e| e.file_name().into_string().ok())
                    .filter(|name| USB_SERIAL_PREFIXES.iter().any(|p| name.starts_with(p)))
                    .map(|name| format!("/dev/{name}"))
                    .collect()
            })
            .unwrap_or_default();
        found.sort();
        if std::path::Path::new(ONBOARD_UART).exists() {
            found.push(ONBOARD_UART.to_string());
        }
        found
    }
}

/// Put `preferred` first and drop duplicates, keeping order.
pub fn ordered_candidates(preferred: Option<&str>, discovered: Vec<String>) -> Vec<String> {
    let mut ordered: Vec<String> = preferred.map(str::to_string).into_iter().collect();
    for port in discovered {
        if !ordered.contains(&port) {
            ordered.push(port);
        }
    }
    ordered
}

// ---------------------------------------------------------------------------
// termios
// ---------------------------------------------------------------------------

#[cfg(unix)]
fn open_serial(
    path: &str,
    baudrate: u32,
    read_timeout: Duration,
) -> Result<std::fs::File, SensorError> {
    use std::os::unix::fs::OpenOptionsExt;
    use std::os::unix::io::AsRawFd;

    let speed = baud_constant(baudrate)?;
    let file = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(libc::O_NOCTTY)
        .open(path)?;
    let fd = file.as_raw_fd();

    // VTIME is in tenths of a second and capped at 25.5s.
    let deciseconds = (read_timeout.as_millis() / 100).clamp(1, 255) as libc::cc_t;

    // SAFETY: `fd` is a valid open descriptor owned by `file` for the whole
    // block, and `tty` is fully initialized by `tcgetattr` before use.
    unsafe {
        let mut tty: libc::termios = std::mem::zeroed();
        if libc::tcgetattr(fd, &mut tty) != 0 {
            return Err(std::io::Error::last_os_error().into());
        }
        libc::cfmakeraw(&mut tty);
        tty.c_cflag |= libc::CLOCAL | libc::CREAD;
        tty.c_cflag &= !(libc::CSTOPB | libc::PARENB | libc::CRTSCTS);
        tty.c_cflag = (tty.c_cflag & !libc::CSIZE) | libc::CS8;
        tty.c_cc[libc::VMIN] = 0;
        tty.c_cc[libc::VTIME] = deciseconds;
        if libc::cfsetispeed(&mut tty, speed) != 0 || libc::cfsetospeed(&mut tty, speed) != 0 {
            return Err(std::io::Error::last_os_error().into());
        }
        if libc::tcsetattr(fd, libc::TCSANOW, &tty) != 0 {
            return Err(std::io::Error::last_os_error().into());
        }
        libc::tcflush(fd, libc::TCIOFLUSH);
    }

    tracing::debug!(port = path, baudrate, "Serial port configured");
    Ok(file)
}

#[cfg(unix)]
fn baud_constant(baudrate: u32) -> Result<libc::speed_t, SensorError> {
    crate::protocol::validate_baudrate(baudrate)?;
    match baudrate {
        9600 => Ok(libc::B9600),
        19200 => Ok(libc::B19200),
        38400 => Ok(libc::B38400),
        57600 => Ok(libc::B57600),
        115200 => Ok(libc::B115200),
        other => Err(SensorError::Unsupported(format!(
            "baud rate {other} is not available on this serial driver"
        ))),
    }
}

#[cfg(not(unix))]
fn open_serial(
    _path: &str,
    _baudrate: u32,
    _read_timeout: Duration,
) -> Result<std::fs::File, SensorError> {
    Err(SensorError::Unsupported(
        "serial ports are only supported on unix platforms".into(),
    ))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn preferred_port_comes_first_without_duplicates() {
        let ordered = ordered_candidates(
            Some("/dev/ttyUSB1"),
            vec!["/dev/ttyUSB0".into(), "/dev/ttyUSB1".into()],
        );
        assert_eq!(ordered, vec!["/dev/ttyUSB1", "/dev/ttyUSB0"]);
    }

    #[test]
    fn no_preference_keeps_discovery_order() {
        let ordered = ordered_candidates(None, vec!["/dev/ttyACM0".into()]);
        assert_eq!(ordered, vec!["/dev/ttyACM0"]);
    }

    #[test]
    fn missing_device_is_an_io_error() {
        let opener = SerialPortOpener::new(Duration::from_millis(100));
        let result = opener.open("/dev/hms-no-such-port", 57_600).map(|_| ());
        if cfg!(unix) {
            assert_matches!(result, Err(SensorError::Io(_)));
        } else {
            assert_matches!(result, Err(SensorError::Unsupported(_)));
        }
    }

    #[cfg(unix)]
    #[test]
    fn invalid_baud_is_rejected_before_opening() {
        assert_matches!(baud_constant(1234), Err(SensorError::InvalidBaudrate(1234)));
        assert_matches!(baud_constant(28_800), Err(SensorError::Unsupported(_)));
    }
}
