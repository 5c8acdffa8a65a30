//! Bounded retry of transient store failures.

use std::fmt;
use std::thread;
use std::time::Duration;

use tracing::warn;

use super::WorkflowError;
use crate::config::WorkflowConfig;
use crate::metrics;

/// An error that knows whether the store might succeed on a second try.
pub trait Retryable: fmt::Display {
    fn is_transient(&self) -> bool;
}

impl Retryable for WorkflowError {
    fn is_transient(&self) -> bool {
        WorkflowError::is_transient(self)
    }
}

/// Retry policy with linear backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&WorkflowConfig::default())
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn from_config(config: &WorkflowConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.retry_backoff_ms),
        )
    }

    /// Run `attempt` until it succeeds, fails with a non-transient error, or
    /// the attempts run out. The last error is returned as is.
    pub fn run<T, E: Retryable>(
        &self,
        operation: &str,
        mut attempt: impl FnMut() -> Result<T, E>,
    ) -> Result<T, E> {
        let mut number = 1;
        loop {
            match attempt() {
                Err(e) if e.is_transient() && number < self.max_attempts => {
                    warn!(
                        operation = operation,
                        attempt = number,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Transient store failure, retrying"
                    );
                    metrics::STORE_RETRIES.inc();
                    thread::sleep(self.backoff * number);
                    number += 1;
                }
                result => return result,
            }
        }
    }
}
