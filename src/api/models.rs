use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Success payload of a completed request
pub type Record = Map<String, Value>;

/// Bearer token for one organisation.
///
/// Owned by the caller and only ever read by this crate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    pub token: String,
    /// Organisation URL, e.g. `https://org.crm4.dynamics.com/`
    pub url: String,
    /// Expiry as a Unix timestamp in seconds
    pub expiration: i64,
}

impl Authorization {
    pub fn new(token: impl Into<String>, url: impl Into<String>, expiration: i64) -> Self {
        Self {
            token: token.into(),
            url: url.into(),
            expiration,
        }
    }

    pub fn is_set(&self) -> bool {
        !self.token.is_empty()
    }

    /// Whether the token expiry lies in the past at `now` (Unix seconds)
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expiration <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(chrono::Utc::now().timestamp())
    }
}

/// Canned payload returned in loopback mode
pub fn loopback_record() -> Record {
    let mut record = Record::new();
    record.insert("isfake".to_string(), Value::Bool(true));
    record
}

pub fn is_loopback_record(record: &Record) -> bool {
    record.get("isfake").and_then(Value::as_bool).unwrap_or(false)
}

/// Read the `id` of a write result; empty when absent
pub fn record_id(record: &Record) -> String {
    record
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
