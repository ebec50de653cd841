//! Structured logging with correlation tracking for Dataverse API calls
//!
//! Every request gets a correlation id so the start, response, throttling
//! and completion events of one call can be tied together in the log.

use super::config::MonitoringConfig;
use log::{debug, info, warn};
use serde_json::json;
use std::time::{Duration, Instant};

/// Structured logger for API operations with correlation tracking
#[derive(Debug, Clone, Default)]
pub struct ApiLogger {
    config: MonitoringConfig,
}

/// Context for a single API call
#[derive(Debug, Clone)]
pub struct OperationContext {
    pub correlation_id: String,
    /// get, post, patch, delete or batch
    pub operation_type: String,
    pub url: String,
    pub start_time: Instant,
}

impl OperationContext {
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl ApiLogger {
    pub fn new(config: MonitoringConfig) -> Self {
        Self { config }
    }

    pub fn is_verbose(&self) -> bool {
        self.config.verbose
    }

    /// Start tracking a call with a fresh correlation id
    pub fn start_operation(&self, operation_type: &str, url: &str) -> OperationContext {
        let context = OperationContext {
            correlation_id: uuid::Uuid::new_v4().to_string(),
            operation_type: operation_type.to_string(),
            url: url.to_string(),
            start_time: Instant::now(),
        };

        if self.config.request_logging {
            let log_data = json!({
                "event": "operation_started",
                "correlation_id": context.correlation_id,
                "operation_type": context.operation_type,
                "url": context.url,
                "timestamp": chrono::Utc::now().to_rfc3339()
            });

            debug!("API Operation Started: {}", log_data);
        }

        context
    }

    /// Log a short-circuited loopback call
    pub fn log_loopback(&self, context: &OperationContext) {
        if !self.config.request_logging {
            return;
        }

        let log_data = json!({
            "event": "loopback",
            "correlation_id": context.correlation_id,
            "operation_type": context.operation_type,
            "url": context.url,
        });

        debug!("Loopback Request: {}", log_data);
    }

    /// Log the status of a response
    pub fn log_response(&self, context: &OperationContext, status_code: u16) {
        if !self.config.request_logging {
            return;
        }

        let log_data = json!({
            "event": "http_response",
            "correlation_id": context.correlation_id,
            "operation_type": context.operation_type,
            "status_code": status_code,
            "duration_ms": context.elapsed().as_millis(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        });

        debug!("HTTP Response: {}", log_data);
    }

    /// Verbose diagnostic for a failed call: URL, status and body
    pub fn log_failure(&self, context: &OperationContext, status_code: u16, body: &str) {
        if !self.config.verbose {
            return;
        }

        warn!(
            "[{}] {} {} failed: HTTP {} - {}",
            context.correlation_id,
            context.operation_type.to_uppercase(),
            context.url,
            status_code,
            body
        );
    }

    /// Log a 429 and the wait before the resubmission
    pub fn log_rate_limit(&self, context: &OperationContext, retry_after: Duration, retry: u32) {
        let log_data = json!({
            "event": "rate_limited",
            "correlation_id": context.correlation_id,
            "operation_type": context.operation_type,
            "retry": retry,
            "delay_ms": retry_after.as_millis(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        });

        warn!("Rate Limited: {}", log_data);
    }

    /// Log the end of a call
    pub fn complete_operation(&self, context: &OperationContext, success: bool, status_code: Option<u16>) {
        if !self.config.request_logging {
            return;
        }

        let log_data = json!({
            "event": "operation_completed",
            "correlation_id": context.correlation_id,
            "operation_type": context.operation_type,
            "url": context.url,
            "duration_ms": context.elapsed().as_millis(),
            "success": success,
            "status_code": status_code,
            "timestamp": chrono::Utc::now().to_rfc3339()
        });

        if success {
            info!("API Operation Completed: {}", log_data);
        } else {
            warn!("API Operation Failed: {}", log_data);
        }
    }
}
