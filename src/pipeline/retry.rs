//! Fixed-delay retry.

use super::error::PipelineError;
use crate::dispatch::{with_recovery, ToolError};
use crate::types::PipelineConfig;
use std::future::Future;
use std::time::Duration;

/// Attempt count and inter-attempt delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.retry_attempts, config.retry_delay)
    }

    /// Run `operation` until it succeeds or the attempts run out.
    ///
    /// The closure receives the 1-based attempt number. At least one attempt
    /// is always made.
    pub async fn run<F, Fut, T>(&self, mut operation: F) -> Result<T, PipelineError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, ToolError>>,
    {
        let attempts = self.attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            let call = async { operation(attempt).await };
            match with_recovery(call, "retry").await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    last_error = err.message();
                    tracing::warn!(
                        attempt,
                        max_attempts = attempts,
                        error_code = err.code(),
                        error = %last_error,
                        "retry_attempt_failed"
                    );
                    if attempt < attempts {
                        tokio::time::sleep(self.delay).await;
                    }
                }
            }
        }

        Err(PipelineError::MaxRetriesExceeded {
            attempts,
            last_error,
        })
    }
}
