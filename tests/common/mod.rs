//! Shared test transport
#![allow(dead_code)]

use async_trait::async_trait;
use dataverse_client::api::{HttpRequest, HttpResponse, Transport, TransportError};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Transport answering from a script and recording every request.
///
/// Once the script is exhausted every call answers `200` with an empty body.
#[derive(Default)]
pub struct MockTransport {
    calls: AtomicUsize,
    script: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses(responses: impl IntoIterator<Item = HttpResponse>) -> Self {
        let mock = Self::new();
        for response in responses {
            mock.push(Ok(response));
        }
        mock
    }

    pub fn push(&self, outcome: Result<HttpResponse, TransportError>) {
        self.script.lock().unwrap().push_back(outcome);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests.lock().unwrap().last().cloned().expect("no request was sent")
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);

        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(HttpResponse::new(200, "")))
    }
}

pub fn header<'a>(request: &'a HttpRequest, name: &str) -> Option<&'a str> {
    request
        .headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

pub fn throttled(retry_after: Option<&str>) -> HttpResponse {
    let response = HttpResponse::new(429, r#"{"error":{"code":"0x80072321","message":"Too many requests"}}"#);
    match retry_after {
        Some(value) => response.with_header("Retry-After", value),
        None => response,
    }
}
