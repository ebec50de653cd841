//! Resilience configuration with builder pattern
//!
//! Groups the retry policy and the diagnostic settings every request
//! is executed with.

use super::retry::RetryConfig;

/// Settings applied to every request issued by a client
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResilienceConfig {
    pub retry: RetryConfig,
    pub monitoring: MonitoringConfig,
}

/// Diagnostic output settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoringConfig {
    /// Log URL, status and body of failed requests at `warn`
    pub verbose: bool,
    /// Trace every request/response at `debug`
    pub request_logging: bool,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            request_logging: true,
        }
    }
}

impl ResilienceConfig {
    pub fn builder() -> ResilienceConfigBuilder {
        ResilienceConfigBuilder::new()
    }

    /// No retries and no request tracing
    pub fn disabled() -> Self {
        Self {
            retry: RetryConfig::disabled(),
            monitoring: MonitoringConfig {
                verbose: false,
                request_logging: false,
            },
        }
    }
}

/// Builder for ResilienceConfig
#[derive(Debug, Default)]
pub struct ResilienceConfigBuilder {
    config: ResilienceConfig,
}

impl ResilienceConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn retry_config(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    /// Set max attempts for transport failures
    pub fn max_retries(mut self, attempts: u32) -> Self {
        self.config.retry.max_attempts = attempts;
        self
    }

    /// Cap on 429 resubmissions; `None` keeps retrying
    pub fn max_rate_limit_retries(mut self, retries: Option<u32>) -> Self {
        self.config.retry.max_rate_limit_retries = retries;
        self
    }

    pub fn verbose(mut self, enabled: bool) -> Self {
        self.config.monitoring.verbose = enabled;
        self
    }

    pub fn request_logging(mut self, enabled: bool) -> Self {
        self.config.monitoring.request_logging = enabled;
        self
    }

    pub fn build(self) -> ResilienceConfig {
        self.config
    }
}
