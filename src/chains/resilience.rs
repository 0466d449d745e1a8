use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::RetrySettings;

/// Bounded retry with linearly increasing backoff: attempt `n` waits `n * base_delay`
/// before attempt `n + 1`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            base_delay: Duration::from_millis(settings.base_delay_ms),
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Runs `operation` until it succeeds, fails with an error `should_retry` rejects,
    /// or the attempt budget is spent. The last error is returned unchanged.
    pub async fn run<F, Fut, T, E, R>(
        &self,
        operation_name: &str,
        mut operation: F,
        should_retry: R,
    ) -> std::result::Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, E>>,
        E: std::fmt::Display,
        R: Fn(&E) -> bool,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        info!(operation = operation_name, attempt, "succeeded after retry");
                    }
                    return Ok(result);
                }
                Err(e) if !should_retry(&e) => return Err(e),
                Err(e) if attempt >= max_attempts => {
                    error!(
                        operation = operation_name,
                        attempts = max_attempts,
                        error = %e,
                        "retry budget exhausted"
                    );
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        operation = operation_name,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying after backoff"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
