//! Retry policies and request diagnostics
//!
//! Transport-level retries with backoff, the 429 resubmission budget, and
//! structured logging shared by every request.

pub mod config;
pub mod logging;
pub mod retry;

pub use config::{MonitoringConfig, ResilienceConfig, ResilienceConfigBuilder};
pub use logging::{ApiLogger, OperationContext};
pub use retry::{RetryConfig, RetryPolicy, RetryableError, sleep_or_cancel};
