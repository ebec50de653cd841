//! Retry policies with exponential backoff
//!
//! Transport failures (connect errors, timeouts) are retried with exponential
//! backoff. Server throttling (HTTP 429) is handled separately by the
//! completion layer, which follows the server's `Retry-After` and only uses
//! `max_rate_limit_retries` from here.

use crate::api::error::{ApiError, Result};
use crate::api::transport::TransportError;
use log::{debug, info, warn};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Attempts per request for transport failures
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub jitter: bool,
    /// Resubmissions allowed after HTTP 429; `None` retries forever
    pub max_rate_limit_retries: Option<u32>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
            max_rate_limit_retries: Some(10),
        }
    }
}

impl RetryConfig {
    /// Single attempt, no throttling retries
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            jitter: false,
            max_rate_limit_retries: Some(0),
        }
    }

    /// Resubmit throttled batches for as long as the server keeps answering 429
    pub fn unbounded_rate_limit(mut self) -> Self {
        self.max_rate_limit_retries = None;
        self
    }

    pub fn with_rate_limit_retries(mut self, retries: u32) -> Self {
        self.max_rate_limit_retries = Some(retries);
        self
    }
}

/// Types of errors and their retry behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryableError {
    /// Connect-phase failure; the request never left the client
    Network,
    /// HTTP 5xx server errors
    ServerError(u16),
    /// HTTP 429 Too Many Requests
    RateLimited,
    /// Request or connect timeout
    Timeout,
    /// Non-retryable client errors
    ClientError(u16),
    Unknown,
}

impl RetryableError {
    /// Whether the transport layer should try the same request again
    pub fn should_retry(&self) -> bool {
        matches!(self, RetryableError::Network | RetryableError::Timeout)
    }

    /// Like [`should_retry`](Self::should_retry), but a timed-out write may
    /// already be committed, so only connect failures are retried for it
    pub fn should_retry_request(&self, idempotent: bool) -> bool {
        match self {
            RetryableError::Timeout => idempotent,
            other => other.should_retry(),
        }
    }

    pub fn from_status_code(status: u16) -> Self {
        match status {
            408 => RetryableError::Timeout,
            429 => RetryableError::RateLimited,
            400..=499 => RetryableError::ClientError(status),
            500..=599 => RetryableError::ServerError(status),
            _ => RetryableError::Unknown,
        }
    }

    pub fn from_reqwest_error(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            RetryableError::Timeout
        } else if error.is_connect() {
            RetryableError::Network
        } else if let Some(status) = error.status() {
            Self::from_status_code(status.as_u16())
        } else {
            RetryableError::Unknown
        }
    }
}

/// Retry policy that implements exponential backoff with jitter
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `operation` until it succeeds, fails permanently, or is cancelled
    pub async fn execute<F, Fut, T>(&self, cancel: &CancellationToken, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = std::result::Result<T, TransportError>>,
    {
        self.execute_request(cancel, true, operation).await
    }

    /// As [`execute`](Self::execute); a non-idempotent operation is not sent
    /// again after a timeout
    pub async fn execute_request<F, Fut, T>(
        &self,
        cancel: &CancellationToken,
        idempotent: bool,
        operation: F,
    ) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = std::result::Result<T, TransportError>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            debug!("Sending request (attempt {}/{})", attempt, max_attempts);

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ApiError::Cancelled),
                outcome = operation() => outcome,
            };

            match outcome {
                Ok(result) => {
                    if attempt > 1 {
                        info!("Request succeeded after {} attempts", attempt);
                    }
                    return Ok(result);
                }
                Err(error) => {
                    let should_retry = error.kind.should_retry_request(idempotent);
                    if !should_retry || attempt >= max_attempts {
                        warn!(
                            "Request failed permanently on attempt {} (should_retry: {}): {}",
                            attempt, should_retry, error
                        );
                        return Err(error.into());
                    }

                    let delay = self.calculate_delay(attempt);
                    warn!("Request failed on attempt {} (retryable), waiting {:?}: {}", attempt, delay, error);
                    sleep_or_cancel(cancel, delay).await?;
                    attempt += 1;
                }
            }
        }
    }

    /// Whether another 429 resubmission is allowed after `retries` so far
    pub fn allows_rate_limit_retry(&self, retries: u32) -> bool {
        self.config.max_rate_limit_retries.is_none_or(|max| retries < max)
    }

    /// Calculate exponential backoff delay with optional jitter
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let delay_ms = (self.config.base_delay.as_millis() as f64)
            * self.config.backoff_multiplier.powi(attempt as i32 - 1);

        let mut delay = Duration::from_millis(delay_ms as u64).min(self.config.max_delay);

        if self.config.jitter {
            let jitter_factor = rand::thread_rng().gen_range(0.5..=1.5);
            delay = Duration::from_millis((delay.as_millis() as f64 * jitter_factor) as u64);
        }

        delay
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

/// Sleep for `delay` unless `cancel` fires first
pub async fn sleep_or_cancel(cancel: &CancellationToken, delay: Duration) -> Result<()> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ApiError::Cancelled),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}
