use super::constants::{self, headers};
use super::error::{ApiError, Result};
use super::models::Authorization;
use super::transport::{HttpRequest, Transport};
use reqwest::Method;
use serde_json::Value;

/// Lifetime assumed when the token response carries no expiry
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Client credentials of an app registration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            tenant_id: tenant_id.into(),
        }
    }

    /// Form body of the client_credentials grant for `resource`
    fn form_body(&self, resource: &str) -> String {
        [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("resource", resource),
        ]
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
    }
}

/// Acquire a token for the organisation at `url` with the client_credentials grant
pub async fn authenticate(transport: &dyn Transport, credentials: &ClientCredentials, url: &str) -> Result<Authorization> {
    log::info!("Authenticating client {} against {}", credentials.client_id, url);

    let request = HttpRequest::new(Method::POST, constants::token_endpoint(&credentials.tenant_id))
        .header(headers::CONTENT_TYPE, headers::CONTENT_TYPE_FORM)
        .body(credentials.form_body(url));

    let response = transport
        .send(request)
        .await
        .map_err(|e| ApiError::Auth(e.to_string()))?;

    log::debug!("Token request status: {}", response.status);

    if !response.is_success() {
        return Err(ApiError::Auth(format!("HTTP {}: {}", response.status, response.body)));
    }

    let token_data: Value = serde_json::from_str(&response.body)
        .map_err(|e| ApiError::Auth(format!("Malformed token response: {}", e)))?;

    let access_token = token_data
        .get("access_token")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::Auth("No access token in response".to_string()))?;

    let expiration = expiration_from(&token_data, chrono::Utc::now().timestamp());

    log::info!("Successfully authenticated, token expires at {}", expiration);
    Ok(Authorization::new(access_token, url, expiration))
}

/// `expires_on` as string or number, else `expires_in` relative to `now`
fn expiration_from(token_data: &Value, now: i64) -> i64 {
    if let Some(expires_on) = token_data.get("expires_on").and_then(as_seconds) {
        return expires_on;
    }

    let expires_in = token_data
        .get("expires_in")
        .and_then(as_seconds)
        .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
    now + expires_in
}

fn as_seconds(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
