//! Recoverable failures collected along best-effort paths.

use tracing::warn;

use crate::error::Error;

/// A step of a teardown that failed without stopping the teardown.
#[derive(Debug)]
pub struct StepFailure {
    pub step: String,
    pub error: Error,
}

/// Collects the recoverable failures of a best-effort sequence.
///
/// Fatal paths propagate `Result` with `?`; teardown paths route every step
/// through [`TeardownReport::record`] so a failure is logged and the sequence
/// moves on.
#[derive(Debug, Default)]
pub struct TeardownReport {
    failures: Vec<StepFailure>,
}

impl TeardownReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of one step, logging a failure at warn level.
    pub fn record<T>(&mut self, step: impl Into<String>, result: Result<T, Error>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                let step = step.into();
                warn!(step = %step, error = %error, "Teardown step failed, continuing");
                self.failures.push(StepFailure { step, error });
                None
            }
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[StepFailure] {
        &self.failures
    }
}
