//! Retry logic with exponential backoff
//!
//! Decisions are a pure function of the error, the attempt number and the
//! configuration. Delays carry no jitter so a given configuration always
//! produces the same schedule.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{NetworkError, Result};

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries allowed after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Double the delay on every attempt when set, constant otherwise
    pub exponential_backoff: bool,
    /// Status codes worth retrying
    pub retryable_status_codes: HashSet<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            exponential_backoff: true,
            retryable_status_codes: HashSet::from([429, 503]),
        }
    }
}

impl RetryConfig {
    /// Create a retry configuration with custom retry count
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_exponential_backoff(mut self, exponential_backoff: bool) -> Self {
        self.exponential_backoff = exponential_backoff;
        self
    }

    pub fn with_retryable_status_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.retryable_status_codes = codes.into_iter().collect();
        self
    }

    /// Validate retry configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.base_delay > self.max_delay {
            return Err("Base delay should be <= max delay".to_string());
        }
        Ok(())
    }
}

/// Applies a [`RetryConfig`] to fallible async operations
#[derive(Debug, Clone, Default)]
pub struct RetryHandler {
    config: RetryConfig,
}

impl RetryHandler {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Determine if a failed attempt should be retried
    pub fn should_retry(&self, error: &NetworkError, attempt: u32) -> bool {
        if attempt >= self.config.max_retries {
            return false;
        }

        match error {
            NetworkError::Timeout | NetworkError::NoConnection => true,
            NetworkError::ServerError { status_code }
            | NetworkError::HttpError { status_code, .. } => {
                self.config.retryable_status_codes.contains(status_code)
            }
            NetworkError::InvalidUrl
            | NetworkError::InvalidResponse
            | NetworkError::Unauthorized
            | NetworkError::Forbidden
            | NetworkError::NotFound
            | NetworkError::Cancelled
            | NetworkError::DecodingFailed(_)
            | NetworkError::EncodingFailed(_)
            | NetworkError::Unknown(_) => false,
        }
    }

    /// Delay to wait after failed attempt number `attempt`
    pub fn delay_for_retry(&self, attempt: u32) -> Duration {
        let max_delay = self.config.max_delay;
        if !self.config.exponential_backoff {
            return self.config.base_delay.min(max_delay);
        }

        2u32.checked_pow(attempt)
            .and_then(|factor| self.config.base_delay.checked_mul(factor))
            .map_or(max_delay, |delay| delay.min(max_delay))
    }

    /// Run `operation` until it succeeds or the policy gives up
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    let delay = self.next_delay(&error, attempt)?;
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Same as [`execute`](Self::execute), stopping with `Cancelled` as soon
    /// as `token` fires during an attempt or a backoff sleep
    pub async fn execute_cancellable<F, Fut, T>(
        &self,
        mut operation: F,
        token: &CancellationToken,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(NetworkError::Cancelled),
                outcome = operation() => outcome,
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(error) => {
                    let delay = self.next_delay(&error, attempt)?;
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => return Err(NetworkError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
            }
        }
    }

    /// Delay before retrying, or the error itself when giving up
    fn next_delay(&self, error: &NetworkError, attempt: u32) -> Result<Duration> {
        if !self.should_retry(error, attempt) {
            tracing::debug!(attempt, error = %error, "request failed, not retrying");
            return Err(error.clone());
        }

        let delay = self.delay_for_retry(attempt);
        tracing::warn!(
            "Request failed (attempt {}/{}), retrying after {:?}: {}",
            attempt + 1,
            self.config.max_retries + 1,
            delay,
            error
        );
        Ok(delay)
    }
}
