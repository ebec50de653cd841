//! Error taxonomy for Dataverse API calls

use serde_json::Value;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    /// A required argument was empty; raised before any I/O
    #[error("{0}")]
    Validation(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("HTTP ERROR {status} - MESSAGE: {body}")]
    Http { status: u16, body: Value },

    /// The server throttled us and `Retry-After` could not be used
    #[error("Rate limited (HTTP {status}), unusable Retry-After: {retry_after:?}")]
    RateLimited {
        status: u16,
        retry_after: Option<String>,
    },

    #[error("Still rate limited after {attempts} attempts")]
    RateLimitExceeded { attempts: u32 },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Request task failed: {0}")]
    TaskFailed(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } | Self::RateLimited { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(error: serde_json::Error) -> Self {
        Self::Encoding(error.to_string())
    }
}
