//! Scheduling for the background refresh loop.
//!
//! Each polled endpoint owns one `PollSchedule`: after a successful
//! fetch the next attempt runs a full interval later, after a failure
//! the short retry delay applies instead. Failures are never terminal;
//! the loop keeps retrying until the daemon answers again.

use std::time::Duration;

/// Delays for the background refresh loop.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Steady-state delay between refreshes.
    pub interval: Duration,
    /// Fallback delay after a failed refresh, shorter than `interval`.
    pub retry_delay: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            retry_delay: Duration::from_secs(5),
        }
    }
}

/// Pick the delay before the next attempt from the fetch outcome.
pub fn next_delay(config: &PollConfig, success: bool) -> Duration {
    if success {
        config.interval
    } else {
        config.retry_delay
    }
}

/// Schedule state of one polled endpoint.
///
/// `None` means no attempt is scheduled — either a fetch is in flight
/// (its completion reschedules) or the endpoint is not being polled.
#[derive(Debug, Clone, Copy, Default)]
pub struct PollSchedule {
    next_at_ms: Option<u64>,
}

impl PollSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule an immediate fetch.
    pub fn fetch_now(&mut self) {
        self.next_at_ms = Some(0);
    }

    /// Mark the fetch as issued; nothing is due until it completes.
    pub fn mark_in_flight(&mut self) {
        self.next_at_ms = None;
    }

    pub fn on_success(&mut self, now_ms: u64, config: &PollConfig) {
        self.next_at_ms = Some(now_ms + config.interval.as_millis() as u64);
    }

    pub fn on_failure(&mut self, now_ms: u64, config: &PollConfig) {
        self.next_at_ms = Some(now_ms + config.retry_delay.as_millis() as u64);
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        self.next_at_ms.map(|t| now_ms >= t).unwrap_or(false)
    }

    /// When the next attempt is due, if one is scheduled.
    pub fn next_at_ms(&self) -> Option<u64> {
        self.next_at_ms
    }
}
