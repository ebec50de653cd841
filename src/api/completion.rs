//! Request completion
//!
//! One logical call is one HTTP exchange that resolves to exactly one
//! `Result`. Calls can be awaited in place or dispatched onto their own
//! tokio task through the `spawn_*` variants, which hand back a [`Pending`].

use super::constants::{self, headers};
use super::error::{ApiError, Result};
use super::models::{Record, loopback_record};
use super::operations::batch::{BatchRequest, BatchResponseItem, BatchResponseParser};
use super::resilience::{ApiLogger, OperationContext, ResilienceConfig, RetryPolicy, sleep_or_cancel};
use super::transport::{HttpRequest, HttpResponse, Transport};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Method;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

static ENTITY_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(constants::ENTITY_ID_PATTERN).expect("entity id pattern is a valid regex"));

/// Result of a `$batch` submission
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    /// Status of the final submission
    pub status: u16,
    /// Submissions made, including resubmissions after 429
    pub attempts: u32,
    /// Decoded sub-responses; empty when the body could not be decoded
    pub responses: Vec<BatchResponseItem>,
    pub is_fake: bool,
}

impl BatchOutcome {
    fn loopback() -> Self {
        Self {
            status: 200,
            attempts: 0,
            responses: Vec::new(),
            is_fake: true,
        }
    }

    /// Sub-responses that did not succeed
    pub fn failures(&self) -> impl Iterator<Item = &BatchResponseItem> {
        self.responses.iter().filter(|item| !item.is_success)
    }
}

/// Executes requests through a [`Transport`]
#[derive(Clone)]
pub struct RequestCompletion {
    transport: Arc<dyn Transport>,
    retry_policy: RetryPolicy,
    logger: ApiLogger,
    cancel: CancellationToken,
}

impl RequestCompletion {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_config(transport, ResilienceConfig::default())
    }

    pub fn with_config(transport: Arc<dyn Transport>, config: ResilienceConfig) -> Self {
        Self {
            transport,
            retry_policy: RetryPolicy::new(config.retry),
            logger: ApiLogger::new(config.monitoring),
            cancel: CancellationToken::new(),
        }
    }

    /// Share an externally owned cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancel every in-flight and future call made through this instance
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// GET `url` and decode the body; an empty body yields an empty record
    pub async fn get(&self, url: &str, token: &str) -> Result<Record> {
        let context = self.logger.start_operation("get", url);
        if constants::is_loopback(url) {
            self.logger.log_loopback(&context);
            return Ok(loopback_record());
        }

        let request = HttpRequest::new(Method::GET, url).bearer_auth(token);
        let response = self.execute(&context, request).await?;
        self.ensure_success(&context, &response)?;

        decode_record(&response.body)
    }

    /// POST a new record; yields `{url, id}` from the `OData-EntityId` header
    pub async fn post(&self, url: &str, token: &str, row: &Record) -> Result<Record> {
        let context = self.logger.start_operation("post", url);
        if constants::is_loopback(url) {
            self.logger.log_loopback(&context);
            return Ok(loopback_record());
        }

        let request = json_request(Method::POST, url, token, row)?;
        let response = self.execute(&context, request).await?;
        self.ensure_success(&context, &response)?;

        let entity_url = response.header(headers::ODATA_ENTITY_ID).unwrap_or_default();
        Ok(entity_reference(entity_url))
    }

    /// PATCH an existing record; the id comes from the response header, else from `url`
    pub async fn patch(&self, url: &str, token: &str, row: &Record) -> Result<Record> {
        let context = self.logger.start_operation("patch", url);
        if constants::is_loopback(url) {
            self.logger.log_loopback(&context);
            return Ok(loopback_record());
        }

        let request = json_request(Method::PATCH, url, token, row)?;
        let response = self.execute(&context, request).await?;
        self.ensure_success(&context, &response)?;

        let entity_url = response.header(headers::ODATA_ENTITY_ID).unwrap_or(url);
        Ok(entity_reference(entity_url))
    }

    /// DELETE the record at `url`
    pub async fn delete(&self, url: &str, token: &str) -> Result<Record> {
        let context = self.logger.start_operation("delete", url);
        if constants::is_loopback(url) {
            self.logger.log_loopback(&context);
            return Ok(loopback_record());
        }

        let request = HttpRequest::new(Method::DELETE, url).bearer_auth(token);
        let response = self.execute(&context, request).await?;
        self.ensure_success(&context, &response)?;

        decode_record(&response.body)
    }

    /// Submit a batch to `{base_url}/api/data/v9.1/$batch`.
    ///
    /// A 429 is answered by sleeping for `Retry-After` seconds and sending the
    /// identical body again, as often as the retry budget allows.
    pub async fn post_batch(&self, base_url: &str, token: &str, batch: &BatchRequest) -> Result<BatchOutcome> {
        let url = constants::batch_endpoint(base_url);
        let context = self.logger.start_operation("batch", &url);
        if constants::is_loopback(base_url) {
            self.logger.log_loopback(&context);
            return Ok(BatchOutcome::loopback());
        }

        let request = HttpRequest::new(Method::POST, &url)
            .header(headers::CONTENT_TYPE, batch.content_type())
            .bearer_auth(token)
            .header(headers::BYPASS_CUSTOM_PLUGINS, "true")
            .body(batch.body.clone());

        let mut attempts = 0;
        let mut rate_limit_retries = 0;

        loop {
            attempts += 1;
            let response = self.execute(&context, request.clone()).await?;

            if response.status == 429 {
                let retry_after = response.header(headers::RETRY_AFTER);
                let Some(delay) = parse_retry_after(retry_after) else {
                    warn!("Batch throttled with unusable Retry-After: {:?}", retry_after);
                    self.logger.complete_operation(&context, false, Some(response.status));
                    return Err(ApiError::RateLimited {
                        status: response.status,
                        retry_after: retry_after.map(str::to_string),
                    });
                };

                if !self.retry_policy.allows_rate_limit_retry(rate_limit_retries) {
                    self.logger.complete_operation(&context, false, Some(response.status));
                    return Err(ApiError::RateLimitExceeded { attempts });
                }

                rate_limit_retries += 1;
                self.logger.log_rate_limit(&context, delay, rate_limit_retries);
                sleep_or_cancel(&self.cancel, delay).await?;
                continue;
            }

            self.ensure_success(&context, &response)?;

            let responses = match BatchResponseParser::parse(&response.body) {
                Ok(items) => items,
                Err(e) => {
                    debug!("Batch response not decoded: {}", e);
                    Vec::new()
                }
            };

            return Ok(BatchOutcome {
                status: response.status,
                attempts,
                responses,
                is_fake: false,
            });
        }
    }

    pub fn spawn_get(&self, url: impl Into<String>, token: impl Into<String>) -> Pending<Record> {
        let this = self.clone();
        let (url, token) = (url.into(), token.into());
        Pending::spawn(async move { this.get(&url, &token).await })
    }

    pub fn spawn_post(&self, url: impl Into<String>, token: impl Into<String>, row: Record) -> Pending<Record> {
        let this = self.clone();
        let (url, token) = (url.into(), token.into());
        Pending::spawn(async move { this.post(&url, &token, &row).await })
    }

    pub fn spawn_patch(&self, url: impl Into<String>, token: impl Into<String>, row: Record) -> Pending<Record> {
        let this = self.clone();
        let (url, token) = (url.into(), token.into());
        Pending::spawn(async move { this.patch(&url, &token, &row).await })
    }

    pub fn spawn_delete(&self, url: impl Into<String>, token: impl Into<String>) -> Pending<Record> {
        let this = self.clone();
        let (url, token) = (url.into(), token.into());
        Pending::spawn(async move { this.delete(&url, &token).await })
    }

    pub fn spawn_batch(
        &self,
        base_url: impl Into<String>,
        token: impl Into<String>,
        batch: BatchRequest,
    ) -> Pending<BatchOutcome> {
        let this = self.clone();
        let (base_url, token) = (base_url.into(), token.into());
        Pending::spawn(async move { this.post_batch(&base_url, &token, &batch).await })
    }

    /// Send through the transport, retrying transient failures
    async fn execute(&self, context: &OperationContext, request: HttpRequest) -> Result<HttpResponse> {
        let transport = Arc::clone(&self.transport);
        let idempotent = matches!(request.method, Method::GET | Method::DELETE);
        let response = self
            .retry_policy
            .execute_request(&self.cancel, idempotent, move || {
                let transport = Arc::clone(&transport);
                let request = request.clone();
                async move { transport.send(request).await }
            })
            .await;

        match response {
            Ok(response) => {
                self.logger.log_response(context, response.status);
                Ok(response)
            }
            Err(e) => {
                self.logger.complete_operation(context, false, None);
                Err(e)
            }
        }
    }

    fn ensure_success(&self, context: &OperationContext, response: &HttpResponse) -> Result<()> {
        if response.is_success() {
            self.logger.complete_operation(context, true, Some(response.status));
            return Ok(());
        }

        self.logger.log_failure(context, response.status, &response.body);
        self.logger.complete_operation(context, false, Some(response.status));

        let body = serde_json::from_str(&response.body).unwrap_or_else(|_| Value::String(response.body.clone()));
        Err(ApiError::Http {
            status: response.status,
            body,
        })
    }
}

/// Handle to a request running on its own task
///
/// Resolves to the request's single `Result`. A task that panics or is
/// aborted resolves to [`ApiError::TaskFailed`].
#[derive(Debug)]
pub struct Pending<T> {
    handle: JoinHandle<Result<T>>,
}

impl<T: Send + 'static> Pending<T> {
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(future),
        }
    }

    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl<T> Future for Pending<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx).map(|joined| match joined {
            Ok(result) => result,
            Err(e) => Err(ApiError::TaskFailed(e.to_string())),
        })
    }
}

fn json_request(method: Method, url: &str, token: &str, row: &Record) -> Result<HttpRequest> {
    let body = serde_json::to_string(row)?;
    Ok(HttpRequest::new(method, url)
        .bearer_auth(token)
        .header(headers::CONTENT_TYPE, headers::CONTENT_TYPE_JSON)
        .body(body))
}

fn decode_record(body: &str) -> Result<Record> {
    if body.trim().is_empty() {
        return Ok(Record::new());
    }
    Ok(serde_json::from_str(body)?)
}

/// `{url, id}` for a written record; `id` is empty when no GUID is found
fn entity_reference(entity_url: &str) -> Record {
    let id = ENTITY_ID
        .find(entity_url)
        .map(|m| m.as_str())
        .unwrap_or_default();

    let mut record = Record::new();
    record.insert("url".to_string(), Value::String(entity_url.to_string()));
    record.insert("id".to_string(), Value::String(id.to_string()));
    record
}

/// Whole seconds from a `Retry-After` header
fn parse_retry_after(value: Option<&str>) -> Option<Duration> {
    value?.trim().parse::<u64>().ok().map(Duration::from_secs)
}
