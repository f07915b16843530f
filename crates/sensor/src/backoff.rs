//! Exponential-backoff retry policy for opening the sensor port.
//!
//! USB serial adapters often need a moment after enumeration before the
//! module answers, so each candidate port is tried a few times with
//! increasing delays before moving on.

use std::time::Duration;

/// Tunable parameters for the exponential-backoff strategy.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts per port, including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(2),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// No waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    /// Run `attempt` until it succeeds or the attempts are used up,
    /// sleeping the current thread between tries. Returns the last error.
    pub fn run<T, E: std::fmt::Display>(
        &self,
        label: &str,
        mut attempt: impl FnMut() -> Result<T, E>,
    ) -> Result<T, E> {
        let mut delay = self.initial_delay;
        let mut tries = 0u32;
        loop {
            tries += 1;
            match attempt() {
                Ok(value) => return Ok(value),
                Err(e) if tries >= self.max_attempts.max(1) => return Err(e),
                Err(e) => {
                    tracing::debug!(
                        target_port = label,
                        attempt = tries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Sensor connection attempt failed, retrying",
                    );
                    std::thread::sleep(delay);
                    delay = next_delay(delay, self);
                }
            }
        }
    }
}

/// Calculate the next backoff delay from the current delay and policy.
///
/// The result is clamped to [`RetryPolicy::max_delay`].
pub fn next_delay(current: Duration, policy: &RetryPolicy) -> Duration {
    let next_ms = (current.as_millis() as f64 * policy.multiplier) as u64;
    Duration::from_millis(next_ms).min(policy.max_delay)
}
