//! Bounded retry with exponential backoff

use super::LookupError;
use std::thread;
use std::time::Duration;

/// How transient catalog failures are retried
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first call
    pub max_attempts: u32,

    /// Delay before the second attempt
    pub initial_delay: Duration,

    /// Factor applied to the delay after every retry
    pub multiplier: f64,

    /// Upper bound for a single delay
    pub max_delay: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: None,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Set the total attempt count (at least one)
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Set the initial backoff delay
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Cap every individual delay
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    /// Delay to wait after the given failed attempt (1-based).
    ///
    /// Saturates at `max_delay`, or at `Duration::MAX` without a cap.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * self.multiplier.max(1.0).powi(exponent);
        let cap = self.max_delay.unwrap_or(Duration::MAX);
        if secs.is_nan() {
            return Duration::ZERO;
        }
        if secs >= cap.as_secs_f64() {
            return cap;
        }
        Duration::try_from_secs_f64(secs).map_or(cap, |delay| delay.min(cap))
    }

    /// Run `op`, retrying transient failures.
    ///
    /// Non-transient errors are returned immediately. After the last
    /// attempt the final transient error is returned.
    pub fn run<T, F>(&self, label: &str, mut op: F) -> Result<T, LookupError>
    where
        F: FnMut() -> Result<T, LookupError>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < attempts => {
                    let delay = self.delay_after(attempt);
                    log::warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {:.1}s...",
                        label,
                        attempt,
                        attempts,
                        e,
                        delay.as_secs_f64()
                    );
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_transient() {
                        log::error!("{} failed after {} attempts: {}", label, attempts, e);
                    }
                    return Err(e);
                }
            }
        }
    }
}
