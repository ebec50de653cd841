//! API Constants and Configuration for the Dataverse Web API

/// Dataverse Web API version
pub const API_VERSION: &str = "v9.1";

/// Base API path, without leading slash
pub const API_BASE_PATH: &str = "api/data";

/// Full API path with version
pub fn api_path() -> String {
    format!("{}/{}", API_BASE_PATH, API_VERSION)
}

/// Batch endpoint for multi-operation requests
pub const BATCH_ENDPOINT: &str = "$batch";

/// URLs starting with this prefix never reach the network
pub const LOOPBACK_PREFIX: &str = "fakeurl";

/// OAuth2 token endpoint, `{}` is the tenant id
pub const TOKEN_ENDPOINT_TEMPLATE: &str = "https://login.microsoftonline.com/{}/oauth2/token";

/// Matches the record GUID inside an `OData-EntityId` value
pub const ENTITY_ID_PATTERN: &str =
    r"[a-fA-F0-9]{8}-[a-fA-F0-9]{4}-[a-fA-F0-9]{4}-[a-fA-F0-9]{4}-[a-fA-F0-9]{12}";

/// Standard headers for Dataverse requests
pub mod headers {
    pub const AUTHORIZATION: &str = "Authorization";
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const RETRY_AFTER: &str = "Retry-After";

    /// Response header carrying the URL of a created/updated record
    pub const ODATA_ENTITY_ID: &str = "OData-EntityId";

    /// Skips custom plugin execution for batch writes
    pub const BYPASS_CUSTOM_PLUGINS: &str = "MSCRM.BypassCustomPluginExecution";

    pub const CONTENT_TYPE_JSON: &str = "application/json";
    pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";
}

/// Token endpoint for a tenant
pub fn token_endpoint(tenant: &str) -> String {
    TOKEN_ENDPOINT_TEMPLATE.replace("{}", tenant)
}

/// Build full entity endpoint URL
pub fn entity_endpoint(base_url: &str, table: &str) -> String {
    format!("{}/{}/{}", trim_base(base_url), api_path(), table)
}

/// Build entity record endpoint URL
pub fn entity_record_endpoint(base_url: &str, table: &str, id: &str) -> String {
    format!("{}/{}/{}({})", trim_base(base_url), api_path(), table, id)
}

/// Build batch endpoint URL
pub fn batch_endpoint(base_url: &str) -> String {
    format!("{}/{}/{}", trim_base(base_url), api_path(), BATCH_ENDPOINT)
}

fn trim_base(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}

/// Request target used inside a changeset part
pub fn changeset_target(base_url: &str, table: &str) -> String {
    format!("{}/{}/{}", trim_base(base_url), api_path(), table)
}

pub fn is_loopback(url: &str) -> bool {
    url.starts_with(LOOPBACK_PREFIX)
}
