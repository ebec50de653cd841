use crate::common::{MockTransport, header};
use dataverse_client::api::{ApiError, ClientCredentials, DataverseClient, HttpResponse, authenticate};
use reqwest::Method;
use std::sync::Arc;

fn credentials() -> ClientCredentials {
    ClientCredentials::new("app-id", "s3cret", "tenant-1")
}

#[tokio::test]
async fn test_authenticate_success() {
    let mock = MockTransport::with_responses([HttpResponse::new(
        200,
        r#"{"token_type":"Bearer","expires_on":"1700003600","access_token":"eyJ0eXAi"}"#,
    )]);

    let auth = authenticate(&mock, &credentials(), "https://org.crm4.dynamics.com/").await.unwrap();

    assert_eq!(auth.token, "eyJ0eXAi");
    assert_eq!(auth.url, "https://org.crm4.dynamics.com/");
    assert_eq!(auth.expiration, 1_700_003_600);
    assert!(auth.is_set());

    let request = mock.last_request();
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.url, "https://login.microsoftonline.com/tenant-1/oauth2/token");
    assert_eq!(header(&request, "Content-Type"), Some("application/x-www-form-urlencoded"));
    assert_eq!(
        request.body.as_deref(),
        Some("grant_type=client_credentials&client_id=app-id&client_secret=s3cret&resource=https%3A%2F%2Forg.crm4.dynamics.com%2F")
    );
}

#[tokio::test]
async fn test_numeric_expiry() {
    let mock = MockTransport::with_responses([HttpResponse::new(200, r#"{"expires_on":1700003600,"access_token":"t"}"#)]);

    let auth = authenticate(&mock, &credentials(), "https://org").await.unwrap();

    assert_eq!(auth.expiration, 1_700_003_600);
}

#[tokio::test]
async fn test_rejected_credentials() {
    let mock = MockTransport::with_responses([HttpResponse::new(
        401,
        r#"{"error":"invalid_client","error_description":"AADSTS7000215: Invalid client secret provided."}"#,
    )]);

    let err = authenticate(&mock, &credentials(), "https://org").await.unwrap_err();

    assert!(matches!(err, ApiError::Auth(message) if message.contains("invalid_client")));
}

#[tokio::test]
async fn test_missing_access_token() {
    let mock = MockTransport::with_responses([HttpResponse::new(200, r#"{"expires_on":"1"}"#)]);

    let err = authenticate(&mock, &credentials(), "https://org").await.unwrap_err();

    assert!(matches!(err, ApiError::Auth(_)));
}

#[tokio::test]
async fn test_client_authenticates_through_its_transport() {
    let mock = Arc::new(MockTransport::with_responses([HttpResponse::new(
        200,
        r#"{"expires_on":"1700003600","access_token":"abc"}"#,
    )]));
    let client = DataverseClient::new(mock.clone());

    let auth = client.authenticate(&credentials(), "https://org").await.unwrap();

    assert_eq!(auth.token, "abc");
    assert_eq!(mock.calls(), 1);
}
