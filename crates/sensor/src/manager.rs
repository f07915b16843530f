//! Shared sensor handle.
//!
//! [`SensorManager`] owns the single serial connection and serializes all
//! device access behind a mutex. Device calls block, so they run on
//! `spawn_blocking`. A cached snapshot of the connection keeps
//! [`SensorManager::status`] responsive while a capture holds the device.
//!
//! Capture follows a small state machine:
//!
//! ```text
//! Idle --capture--> Processing{student} --ok--> Complete{student}
//!                        |
//!                        +--error--> Idle{last_error}
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

use chrono::{DateTime, Utc};
use hms_core::types::DbId;
use serde::Serialize;

use crate::config::SensorConfig;
use crate::driver::{encode_template, FingerprintDriver, ScanOptions};
use crate::error::SensorError;
use crate::protocol::{validate_baudrate, SystemParameters};
use crate::transport::{ordered_candidates, PortOpener, SerialIo, SerialPortOpener};

/// Hints returned whenever the sensor is not connected.
const SUGGESTIONS: &[&str] = &[
    "Check that the fingerprint sensor is plugged in and powered",
    "Verify the serial port (for example /dev/ttyUSB0) and baud rate",
    "Make sure the service user may access the port (dialout group)",
    "Try a manual port test with another port or baud rate",
];

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Step of a running capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStage {
    RightThumb,
    LeftThumb,
}

/// Observable state of the biometric capture flow.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CaptureState {
    Idle {
        last_error: Option<String>,
    },
    Processing {
        student_id: DbId,
        stage: CaptureStage,
        started_at: DateTime<Utc>,
    },
    Complete {
        student_id: DbId,
        finished_at: DateTime<Utc>,
    },
}

impl Default for CaptureState {
    fn default() -> Self {
        Self::Idle { last_error: None }
    }
}

/// Connection report for the admin console.
#[derive(Debug, Clone, Serialize)]
pub struct SensorStatus {
    pub connected: bool,
    pub port: Option<String>,
    pub baudrate: Option<u32>,
    pub template_count: Option<u16>,
    pub storage_capacity: Option<u16>,
    pub security_level: Option<u16>,
    pub error: Option<String>,
    pub suggestions: Vec<String>,
    pub capture: CaptureState,
}

/// Result of [`SensorManager::initialize`].
#[derive(Debug, Clone, Serialize)]
pub struct InitOutcome {
    pub success: bool,
    pub message: String,
    pub status: SensorStatus,
}

/// Hex-encoded templates of both thumbs.
#[derive(Debug, Clone, Serialize)]
pub struct CapturedThumbs {
    pub right_thumb: String,
    pub left_thumb: String,
    pub device_id: String,
}

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

struct Connection {
    port: String,
    baudrate: u32,
    params: SystemParameters,
    driver: FingerprintDriver<Box<dyn SerialIo>>,
}

#[derive(Default)]
struct DeviceSlot {
    connection: Option<Connection>,
    /// Port chosen through a successful manual test.
    manual: Option<(String, u32)>,
}

#[derive(Debug, Clone, Default)]
struct Snapshot {
    connected: bool,
    port: Option<String>,
    baudrate: Option<u32>,
    params: Option<SystemParameters>,
    template_count: Option<u16>,
    error: Option<String>,
}

struct Inner {
    config: SensorConfig,
    opener: Arc<dyn PortOpener>,
    device: Mutex<DeviceSlot>,
    snapshot: Mutex<Snapshot>,
    capture: Mutex<CaptureState>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// SensorManager
// ---------------------------------------------------------------------------

/// Cheaply cloneable handle to the fingerprint sensor.
#[derive(Clone)]
pub struct SensorManager {
    inner: Arc<Inner>,
}

impl SensorManager {
    pub fn new(config: SensorConfig, opener: Arc<dyn PortOpener>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                opener,
                device: Mutex::new(DeviceSlot::default()),
                snapshot: Mutex::new(Snapshot::default()),
                capture: Mutex::new(CaptureState::default()),
            }),
        }
    }

    /// Manager backed by real serial ports.
    pub fn with_serial(config: SensorConfig) -> Self {
        let opener = Arc::new(SerialPortOpener::new(config.read_timeout));
        Self::new(config, opener)
    }

    /// Current capture state, for polling.
    pub fn capture_state(&self) -> CaptureState {
        lock(&self.inner.capture).clone()
    }

    /// Report the connection, refreshing the template count when the
    /// device is idle.
    pub async fn status(&self) -> SensorStatus {
        let inner = Arc::clone(&self.inner);
        let refreshed = tokio::task::spawn_blocking(move || {
            inner.refresh();
            inner.status()
        })
        .await;
        match refreshed {
            Ok(status) => status,
            Err(e) => {
                tracing::error!(error = %e, "Sensor status task failed");
                self.inner.status()
            }
        }
    }

    /// Connect to the preferred port or the first responsive candidate.
    ///
    /// Failure is reported in the outcome, never as an error.
    pub async fn initialize(&self) -> InitOutcome {
        let inner = Arc::clone(&self.inner);
        let result = tokio::task::spawn_blocking(move || {
            let mut slot = lock(&inner.device);
            inner.connect_any(&mut slot)
        })
        .await
        .unwrap_or_else(|e| Err(format!("Sensor task failed: {e}")));

        match result {
            Ok(port) => InitOutcome {
                success: true,
                message: format!("Fingerprint sensor connected on {port}"),
                status: self.inner.status(),
            },
            Err(message) => InitOutcome {
                success: false,
                message,
                status: self.inner.status(),
            },
        }
    }

    /// Probe one port. On success it becomes the active and preferred port.
    pub async fn test_port(&self, port: String, baudrate: u32) -> Result<SensorStatus, SensorError> {
        validate_baudrate(baudrate)?;
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || -> Result<SensorStatus, SensorError> {
            let connection = inner.connect(&port, baudrate)?;
            let mut slot = lock(&inner.device);
            slot.manual = Some((port.clone(), baudrate));
            inner.install(&mut slot, connection);
            tracing::info!(port = %port, baudrate, "Manual sensor port accepted");
            Ok(inner.status())
        })
        .await
        .map_err(|e| SensorError::Task(e.to_string()))?
    }

    /// Enroll both thumbs of a student.
    ///
    /// Only one capture runs at a time; a second request while one is
    /// processing fails with [`SensorError::Busy`]. The blocking task owns
    /// the state transitions, so dropping the returned future leaves the
    /// capture to finish on its own and the flow still ends in `Complete`
    /// or `Idle`.
    pub async fn capture_both_thumbs(&self, student_id: DbId) -> Result<CapturedThumbs, SensorError> {
        {
            let mut state = lock(&self.inner.capture);
            if matches!(*state, CaptureState::Processing { .. }) {
                return Err(SensorError::Busy);
            }
            *state = CaptureState::Processing {
                student_id,
                stage: CaptureStage::RightThumb,
                started_at: Utc::now(),
            };
        }
        tracing::info!(student_id, "Biometric capture started");

        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let run = CaptureRun {
                inner: &inner,
                student_id,
            };
            let result = inner.capture(student_id);
            run.finish(&result);
            result
        })
        .await
        .map_err(|e| SensorError::Task(e.to_string()))?
    }
}

/// Ends a capture run. If the run unwinds before [`CaptureRun::finish`],
/// the flow is put back to `Idle`.
struct CaptureRun<'a> {
    inner: &'a Inner,
    student_id: DbId,
}

impl CaptureRun<'_> {
    fn finish(self, result: &Result<CapturedThumbs, SensorError>) {
        let student_id = self.student_id;
        let next = match result {
            Ok(_) => {
                tracing::info!(student_id, "Biometric capture complete");
                CaptureState::Complete {
                    student_id,
                    finished_at: Utc::now(),
                }
            }
            Err(e) => {
                tracing::warn!(student_id, error = %e, "Biometric capture failed");
                CaptureState::Idle {
                    last_error: Some(e.to_string()),
                }
            }
        };
        *lock(&self.inner.capture) = next;
        std::mem::forget(self);
    }
}

impl Drop for CaptureRun<'_> {
    fn drop(&mut self) {
        tracing::error!(student_id = self.student_id, "Biometric capture aborted");
        *lock(&self.inner.capture) = CaptureState::Idle {
            last_error: Some("Capture aborted".into()),
        };
    }
}

// ---------------------------------------------------------------------------
// Blocking internals
// ---------------------------------------------------------------------------

impl Inner {
    fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            finger_timeout: self.config.finger_timeout,
            poll_interval: self.config.poll_interval,
        }
    }

    /// Open `port` and authenticate.
    fn connect(&self, port: &str, baudrate: u32) -> Result<Connection, SensorError> {
        let transport = self.opener.open(port, baudrate)?;
        let mut driver =
            FingerprintDriver::new(transport, self.config.address, self.config.password);
        driver.verify_password()?;
        let params = driver.system_parameters()?;
        Ok(Connection {
            port: port.to_string(),
            baudrate,
            params,
            driver,
        })
    }

    /// Try every candidate port with retries until one answers.
    ///
    /// Returns the connected port, or a message listing each failure.
    fn connect_any(&self, slot: &mut DeviceSlot) -> Result<String, String> {
        let (preferred, manual_baud) = match &slot.manual {
            Some((port, baud)) => (Some(port.clone()), Some(*baud)),
            None => (self.config.port.clone(), None),
        };
        let candidates = ordered_candidates(preferred.as_deref(), self.opener.candidates());

        if candidates.is_empty() {
            let message = "No serial ports found for the fingerprint sensor".to_string();
            self.record_failure(slot, &message);
            return Err(message);
        }

        let mut failures = Vec::new();
        for port in candidates {
            let baudrate = match (&preferred, manual_baud) {
                (Some(p), Some(baud)) if *p == port => baud,
                _ => self.config.baudrate,
            };
            match self.config.retry.run(&port, || self.connect(&port, baudrate)) {
                Ok(connection) => {
                    self.install(slot, connection);
                    tracing::info!(port = %port, baudrate, "Fingerprint sensor connected");
                    return Ok(port);
                }
                Err(e) => failures.push(format!("{port}: {e}")),
            }
        }

        let message = format!("Fingerprint sensor not found ({})", failures.join("; "));
        tracing::warn!(error = %message, "Fingerprint sensor initialization failed");
        self.record_failure(slot, &message);
        Err(message)
    }

    /// Make `connection` the active one and refresh the snapshot.
    fn install(&self, slot: &mut DeviceSlot, mut connection: Connection) {
        let template_count = connection.driver.template_count().ok();
        *lock(&self.snapshot) = Snapshot {
            connected: true,
            port: Some(connection.port.clone()),
            baudrate: Some(connection.baudrate),
            params: Some(connection.params),
            template_count,
            error: None,
        };
        slot.connection = Some(connection);
    }

    fn record_failure(&self, slot: &mut DeviceSlot, message: &str) {
        slot.connection = None;
        let mut snapshot = lock(&self.snapshot);
        snapshot.connected = false;
        snapshot.error = Some(message.to_string());
    }

    /// Re-read the template count unless a capture holds the device.
    fn refresh(&self) {
        let mut slot = match self.device.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(p)) => p.into_inner(),
            Err(TryLockError::WouldBlock) => return,
        };
        let Some(connection) = slot.connection.as_mut() else {
            return;
        };
        match connection.driver.template_count() {
            Ok(count) => lock(&self.snapshot).template_count = Some(count),
            Err(e) if e.is_link_failure() => {
                tracing::warn!(error = %e, "Fingerprint sensor stopped responding");
                self.record_failure(&mut slot, &e.to_string());
            }
            Err(e) => lock(&self.snapshot).error = Some(e.to_string()),
        }
    }

    fn status(&self) -> SensorStatus {
        let snapshot = lock(&self.snapshot).clone();
        let suggestions = if snapshot.connected {
            Vec::new()
        } else {
            SUGGESTIONS.iter().map(|s| s.to_string()).collect()
        };
        SensorStatus {
            connected: snapshot.connected,
            port: snapshot.port,
            baudrate: snapshot.baudrate,
            template_count: snapshot.template_count,
            storage_capacity: snapshot.params.map(|p| p.storage_capacity),
            security_level: snapshot.params.map(|p| p.security_level),
            error: snapshot.error,
            suggestions,
            capture: lock(&self.capture).clone(),
        }
    }

    fn set_stage(&self, stage: CaptureStage) {
        if let CaptureState::Processing { stage: current, .. } = &mut *lock(&self.capture) {
            *current = stage;
        }
    }

    fn capture(&self, student_id: DbId) -> Result<CapturedThumbs, SensorError> {
        let mut slot = lock(&self.device);
        if slot.connection.is_none() {
            self.connect_any(&mut slot)
                .map_err(|_| SensorError::NotConnected)?;
        }
        let options = self.scan_options();
        let connection = slot.connection.as_mut().ok_or(SensorError::NotConnected)?;

        let result: Result<CapturedThumbs, SensorError> = (|| {
            tracing::debug!(student_id, "Place right thumb on the sensor");
            let right = connection.driver.enroll_template(&options)?;

            self.set_stage(CaptureStage::LeftThumb);
            connection.driver.wait_for_removal(&options)?;
            tracing::debug!(student_id, "Place left thumb on the sensor");
            let left = connection.driver.enroll_template(&options)?;

            Ok(CapturedThumbs {
                right_thumb: encode_template(&right),
                left_thumb: encode_template(&left),
                device_id: format!(
                    "{:08X}@{}",
                    connection.params.device_address, connection.port
                ),
            })
        })();

        if let Err(e) = &result {
            if e.is_link_failure() {
                self.record_failure(&mut slot, &e.to_string());
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert_matches::assert_matches;

    use super::*;
    use crate::backoff::RetryPolicy;
    use crate::mock::{self, MockOpener};

    fn config() -> SensorConfig {
        SensorConfig {
            retry: RetryPolicy::immediate(2),
            poll_interval: Duration::ZERO,
            finger_timeout: Duration::from_secs(1),
            ..SensorConfig::default()
        }
    }

    fn manager(opener: MockOpener) -> SensorManager {
        SensorManager::new(config(), Arc::new(opener))
    }

    #[tokio::test]
    async fn initialize_uses_first_responsive_candidate() {
        let opener = MockOpener::new(&["/dev/ttyUSB0", "/dev/ttyUSB1"])
            .script("/dev/ttyUSB1", mock::handshake(4));
        let outcome = manager(opener).initialize().await;

        assert!(outcome.success, "{}", outcome.message);
        assert_eq!(outcome.status.port.as_deref(), Some("/dev/ttyUSB1"));
        assert_eq!(outcome.status.template_count, Some(4));
        assert_eq!(outcome.status.storage_capacity, Some(1000));
        assert!(outcome.status.suggestions.is_empty());
    }

    #[tokio::test]
    async fn initialize_without_ports_reports_suggestions() {
        let outcome = manager(MockOpener::new(&[])).initialize().await;
        assert!(!outcome.success);
        assert!(!outcome.status.connected);
        assert!(outcome.status.error.is_some());
        assert!(!outcome.status.suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_port_rejects_invalid_baudrate() {
        let result = manager(MockOpener::new(&[])).test_port("/dev/x".into(), 1234).await;
        assert_matches!(result, Err(SensorError::InvalidBaudrate(1234)));
    }

    #[tokio::test]
    async fn successful_port_test_becomes_active_port() {
        let mut replies = mock::handshake(1);
        replies.push(mock::ack(&[0x00, 0x00, 0x02]));
        let m = manager(MockOpener::new(&[]).script("/dev/custom", replies));

        let status = m.test_port("/dev/custom".into(), 115_200).await.unwrap();
        assert!(status.connected);
        assert_eq!(status.baudrate, Some(115_200));

        let refreshed = m.status().await;
        assert_eq!(refreshed.port.as_deref(), Some("/dev/custom"));
        assert_eq!(refreshed.template_count, Some(2));
    }

    #[tokio::test]
    async fn silent_device_is_disconnected_on_status() {
        let m = manager(MockOpener::new(&["/dev/ttyUSB0"]).script("/dev/ttyUSB0", mock::handshake(0)));
        assert!(m.initialize().await.success);

        let status = m.status().await;
        assert!(!status.connected);
        assert!(status.error.is_some());
    }

    #[tokio::test]
    async fn capture_enrolls_both_thumbs() {
        let right: Vec<u8> = vec![0xAA; 8];
        let left: Vec<u8> = vec![0x0B; 8];
        let mut replies = mock::handshake(0);
        replies.extend(mock::enrollment(&right));
        replies.push(mock::no_finger());
        replies.extend(mock::enrollment(&left));

        let m = manager(MockOpener::new(&["/dev/ttyUSB0"]).script("/dev/ttyUSB0", replies));
        assert!(m.initialize().await.success);

        let thumbs = m.capture_both_thumbs(12).await.unwrap();
        assert_eq!(thumbs.right_thumb, "aa".repeat(8));
        assert_eq!(thumbs.left_thumb, "0b".repeat(8));
        assert_eq!(thumbs.device_id, "FFFFFFFF@/dev/ttyUSB0");
        assert_matches!(m.capture_state(), CaptureState::Complete { student_id: 12, .. });
    }

    #[tokio::test]
    async fn capture_without_sensor_returns_to_idle() {
        let m = manager(MockOpener::new(&[]));
        assert_matches!(m.capture_both_thumbs(3).await, Err(SensorError::NotConnected));
        assert_matches!(
            m.capture_state(),
            CaptureState::Idle { last_error: Some(msg) } if msg.contains("not connected")
        );
    }

    #[tokio::test]
    async fn second_capture_while_processing_is_busy() {
        let m = manager(MockOpener::new(&[]));
        *lock(&m.inner.capture) = CaptureState::Processing {
            student_id: 1,
            stage: CaptureStage::RightThumb,
            started_at: Utc::now(),
        };
        assert_matches!(m.capture_both_thumbs(2).await, Err(SensorError::Busy));
    }

    #[tokio::test]
    async fn dropped_capture_request_still_returns_to_idle() {
        let mut replies = mock::handshake(0);
        replies.extend(std::iter::repeat_with(mock::no_finger).take(200));
        let config = SensorConfig {
            poll_interval: Duration::from_millis(20),
            finger_timeout: Duration::from_millis(300),
            ..config()
        };
        let opener = MockOpener::new(&["/dev/ttyUSB0"]).script("/dev/ttyUSB0", replies);
        let m = SensorManager::new(config, Arc::new(opener));
        assert!(m.initialize().await.success);

        let dropped = tokio::time::timeout(Duration::from_millis(100), m.capture_both_thumbs(7)).await;
        assert!(dropped.is_err());
        assert_matches!(m.capture_state(), CaptureState::Processing { student_id: 7, .. });

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_matches!(
            m.capture_state(),
            CaptureState::Idle { last_error: Some(msg) } if msg.contains("no finger")
        );
        assert_matches!(m.capture_both_thumbs(7).await, Err(SensorError::NotConnected));
    }

    #[test]
    fn capture_state_serializes_with_tag() {
        let json = serde_json::to_value(CaptureState::default()).unwrap();
        assert_eq!(json["state"], "idle");
        assert!(json["last_error"].is_null());
    }
}
