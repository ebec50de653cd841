//! Dataverse $batch response parser
//!
//! Splits a multipart/mixed batch response into one item per sub-response.

use crate::api::error::{ApiError, Result};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
enum ParsingState {
    PartHeaders,
    StatusLine,
    HttpHeaders,
    Body,
}

/// Individual response item from a batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResponseItem {
    pub content_id: Option<u32>,
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
    pub is_success: bool,
}

impl BatchResponseItem {
    /// Body decoded as JSON, if it is JSON
    pub fn json(&self) -> Option<Value> {
        self.body.as_deref().and_then(|b| serde_json::from_str(b).ok())
    }

    pub fn error_message(&self) -> Option<String> {
        if self.is_success {
            None
        } else {
            BatchResponseParser::extract_error_message(self.body.as_deref())
                .or_else(|| Some(format!("HTTP {}", self.status_code)))
        }
    }
}

/// Parser for batch responses
pub struct BatchResponseParser;

impl BatchResponseParser {
    /// Parse a batch response into its sub-responses, in wire order
    pub fn parse(response_text: &str) -> Result<Vec<BatchResponseItem>> {
        let batch_boundary = Self::extract_boundary(response_text, "batchresponse")?;
        let mut items = Vec::new();

        for part in response_text.split(&format!("--{}", batch_boundary)) {
            let part = part.trim();
            if part.is_empty() || part == "--" {
                continue;
            }

            if part.contains("changesetresponse") && part.contains("multipart/mixed") {
                let changeset_boundary = Self::extract_boundary(part, "changesetresponse")?;
                for inner in part.split(&format!("--{}", changeset_boundary)) {
                    let inner = inner.trim();
                    if inner.contains("application/http") {
                        items.push(Self::parse_http_response(inner));
                    }
                }
            } else if part.contains("application/http") {
                items.push(Self::parse_http_response(part));
            }
        }

        Ok(items)
    }

    /// Find the item answering the request with the given Content-ID
    pub fn find(items: &[BatchResponseItem], content_id: u32) -> Option<&BatchResponseItem> {
        items.iter().find(|item| item.content_id == Some(content_id))
    }

    fn parse_http_response(text: &str) -> BatchResponseItem {
        let mut content_id = None;
        let mut status_code = 500;
        let mut headers = HashMap::new();
        let mut body_lines = Vec::new();
        let mut state = ParsingState::PartHeaders;

        for line in text.lines() {
            let line = line.trim_end_matches('\r');

            match state {
                ParsingState::PartHeaders => {
                    if line.trim().is_empty() {
                        state = ParsingState::StatusLine;
                    } else if let Some(id) = header_value(line, "Content-ID") {
                        content_id = id.parse().ok();
                    }
                }
                ParsingState::StatusLine => {
                    if line.starts_with("HTTP/") {
                        status_code = line
                            .split_whitespace()
                            .nth(1)
                            .and_then(|s| s.parse().ok())
                            .unwrap_or(500);
                        state = ParsingState::HttpHeaders;
                    }
                }
                ParsingState::HttpHeaders => {
                    if line.trim().is_empty() {
                        state = ParsingState::Body;
                    } else if let Some((name, value)) = line.split_once(':') {
                        headers.insert(name.trim().to_string(), value.trim().to_string());
                    }
                }
                ParsingState::Body => body_lines.push(line),
            }
        }

        let body_text = body_lines.join("\n").trim().to_string();
        let body = if body_text.is_empty() { None } else { Some(body_text) };

        BatchResponseItem {
            content_id,
            status_code,
            headers,
            body,
            is_success: (200..300).contains(&status_code),
        }
    }

    /// Boundary of the given kind, from a delimiter line or a Content-Type header
    fn extract_boundary(text: &str, kind: &str) -> Result<String> {
        for line in text.lines() {
            if let Some(rest) = line.trim().strip_prefix("--") {
                if rest.starts_with(kind) {
                    return Ok(rest.trim_end_matches("--").trim().to_string());
                }
            }
        }

        for line in text.lines() {
            if let Some(pos) = line.find("boundary=") {
                let candidate = line[pos + "boundary=".len()..]
                    .split(|c: char| c.is_whitespace() || c == ';')
                    .next()
                    .unwrap_or_default()
                    .trim_matches('"');
                if candidate.starts_with(kind) {
                    return Ok(candidate.to_string());
                }
            }
        }

        Err(ApiError::Encoding(format!("Could not find {} boundary in batch response", kind)))
    }

    /// Human readable message from a Dataverse error body
    pub fn extract_error_message(body: Option<&str>) -> Option<String> {
        let body = body?.trim();
        if body.is_empty() {
            return None;
        }

        if let Ok(json) = serde_json::from_str::<Value>(body) {
            if let Some(message) = json.pointer("/error/message").and_then(Value::as_str) {
                let code = json.pointer("/error/code").and_then(Value::as_str).unwrap_or("Unknown");
                return Some(format!("Dataverse Error [{}]: {}", code, message));
            }
            if let Some(message) = json.get("Message").and_then(Value::as_str) {
                return Some(format!("Dataverse Error: {}", message));
            }
        }

        Some(body.to_string())
    }
}

fn header_value<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let (key, value) = line.split_once(':')?;
    key.trim().eq_ignore_ascii_case(name).then(|| value.trim())
}
