//! Readiness deadline for bounded polling.

use std::time::Duration;

use tokio::time::Instant;

/// A timeout paired with the instant polling began.
///
/// Built on tokio's monotonic clock, so paused test runtimes drive it.
#[derive(Debug, Clone, Copy)]
pub struct ReadinessDeadline {
    started: Instant,
    timeout: Duration,
}

impl ReadinessDeadline {
    /// Starts the deadline now.
    pub fn start(timeout: Duration) -> Self {
        Self {
            started: Instant::now(),
            timeout,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// True once the elapsed time has reached the timeout.
    pub fn is_expired(&self) -> bool {
        self.elapsed() >= self.timeout
    }
}
