use crate::common::{MockTransport, header};
use dataverse_client::api::{
    ApiError, Authorization, BatchOperation, BatchRequestBuilder, BatchRequestParams, Condition, CreateUpdateRequest,
    DataverseClient, DeleteRequest, Filter, HttpResponse, Record, RetrieveMultipleRequest, RetrieveRequest, RetryableError, TransportError,
};
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;

fn auth() -> Authorization {
    Authorization::new("token", "https://org.crm4.dynamics.com", 4_102_444_800)
}

fn row() -> Record {
    json!({"name": "Contoso"}).as_object().cloned().unwrap()
}

fn setup() -> (Arc<MockTransport>, DataverseClient) {
    let mock = Arc::new(MockTransport::new());
    let client = DataverseClient::new(mock.clone());
    (mock, client)
}

fn assert_validation(result: Result<impl std::fmt::Debug, ApiError>, message: &str) {
    match result {
        Err(ApiError::Validation(m)) => assert_eq!(m, message),
        other => panic!("expected validation error '{}', got {:?}", message, other),
    }
}

#[tokio::test]
async fn test_validation_happens_before_io() {
    let (mock, client) = setup();
    let empty = Authorization::default();
    let auth = auth();

    assert_validation(client.retrieve(RetrieveRequest::new(&empty, "contacts", "1")).await, "Empty auth");
    assert_validation(client.retrieve(RetrieveRequest::new(&auth, "", "1")).await, "Empty table");
    assert_validation(client.retrieve(RetrieveRequest::new(&auth, "contacts", "")).await, "Empty Id");

    assert_validation(client.retrieve_multiple(RetrieveMultipleRequest::new(&empty, "contacts")).await, "Empty auth");
    assert_validation(client.retrieve_multiple(RetrieveMultipleRequest::new(&auth, "")).await, "Empty table");

    assert_validation(client.create_update(CreateUpdateRequest::create(&empty, "contacts", row())).await, "Empty auth");
    assert_validation(client.create_update(CreateUpdateRequest::create(&auth, "", row())).await, "Empty table");

    assert_validation(client.delete(DeleteRequest::new(&empty, "contacts", "1")).await, "Empty auth");
    assert_validation(client.delete(DeleteRequest::new(&auth, "", "1")).await, "Empty table");
    assert_validation(client.delete(DeleteRequest::new(&auth, "contacts", "")).await, "Empty Id");

    assert_validation(client.batch(BatchRequestParams::new(&empty, vec![])).await, "Empty auth");

    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn test_retrieve_url() {
    let (mock, client) = setup();
    let auth = auth();

    client
        .retrieve(RetrieveRequest::new(&auth, "contacts", "123").columns(["fullname", "emailaddress1"]))
        .await
        .unwrap();

    let request = mock.last_request();
    assert_eq!(request.method, Method::GET);
    assert_eq!(
        request.url,
        "https://org.crm4.dynamics.com/api/data/v9.1/contacts(123)?$select=fullname%2Cemailaddress1"
    );
    assert_eq!(header(&request, "Authorization"), Some("Bearer token"));
}

#[tokio::test]
async fn test_retrieve_multiple_prefers_filter_tree() {
    let (mock, client) = setup();
    let auth = auth();
    let filter = Filter::or()
        .with_condition(Condition::raw("startswith(fullname,'K')"))
        .with_condition(Condition::raw("startswith(fullname,'C')"));

    client
        .retrieve_multiple(
            RetrieveMultipleRequest::new(&auth, "contacts")
                .filter(filter)
                .filter_string("ignored eq 1"),
        )
        .await
        .unwrap();

    let url = mock.last_request().url;
    let query = url.split_once("?$filter=").unwrap().1;
    assert_eq!(
        urlencoding::decode(query).unwrap(),
        "(startswith(fullname,'K') or startswith(fullname,'C'))"
    );
}

#[tokio::test]
async fn test_retrieve_multiple_with_strings_only() {
    let (mock, client) = setup();
    let auth = auth();

    client
        .retrieve_multiple(
            RetrieveMultipleRequest::new(&auth, "accounts")
                .columns_string("name")
                .filter_string("statecode eq 0"),
        )
        .await
        .unwrap();

    assert_eq!(
        mock.last_request().url,
        "https://org.crm4.dynamics.com/api/data/v9.1/accounts?$select=name&$filter=statecode%20eq%200"
    );
}

#[tokio::test]
async fn test_retrieve_multiple_without_options() {
    let (mock, client) = setup();
    let auth = auth();

    client.retrieve_multiple(RetrieveMultipleRequest::new(&auth, "accounts")).await.unwrap();

    assert_eq!(mock.last_request().url, "https://org.crm4.dynamics.com/api/data/v9.1/accounts");
}

#[tokio::test]
async fn test_create_returns_new_id() {
    let mock = Arc::new(MockTransport::with_responses([HttpResponse::new(204, "").with_header(
        "OData-EntityId",
        "https://org.crm4.dynamics.com/api/data/v9.1/accounts(7d5b7f2e-1c2a-4b7e-9a51-2f6d0c1e8a10)",
    )]));
    let client = DataverseClient::new(mock.clone());
    let auth = auth();

    let id = client.create_update(CreateUpdateRequest::create(&auth, "accounts", row())).await.unwrap();

    assert_eq!(id, "7d5b7f2e-1c2a-4b7e-9a51-2f6d0c1e8a10");
    let request = mock.last_request();
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.url, "https://org.crm4.dynamics.com/api/data/v9.1/accounts");
}

#[tokio::test]
async fn test_update_targets_record() {
    let (mock, client) = setup();
    let auth = auth();
    let id = "7d5b7f2e-1c2a-4b7e-9a51-2f6d0c1e8a10";

    let returned = client
        .create_update(CreateUpdateRequest::update(&auth, "accounts", id, row()))
        .await
        .unwrap();

    assert_eq!(returned, id);
    let request = mock.last_request();
    assert_eq!(request.method, Method::PATCH);
    assert_eq!(request.url, format!("https://org.crm4.dynamics.com/api/data/v9.1/accounts({})", id));
}

#[tokio::test]
async fn test_delete_request() {
    let mock = Arc::new(MockTransport::with_responses([HttpResponse::new(204, "")]));
    let client = DataverseClient::new(mock.clone());
    let auth = auth();

    client.delete(DeleteRequest::new(&auth, "accounts", "42")).await.unwrap();

    let request = mock.last_request();
    assert_eq!(request.method, Method::DELETE);
    assert_eq!(request.url, "https://org.crm4.dynamics.com/api/data/v9.1/accounts(42)");
}

#[tokio::test]
async fn test_delete_surfaces_http_errors() {
    let mock = Arc::new(MockTransport::with_responses([HttpResponse::new(
        404,
        r#"{"error":{"code":"0x80040217","message":"Does Not Exist"}}"#,
    )]));
    let client = DataverseClient::new(mock.clone());
    let auth = auth();

    let err = client.delete(DeleteRequest::new(&auth, "accounts", "42")).await.unwrap_err();

    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_batch_with_fixed_seed() {
    let (mock, client) = setup();
    let auth = Authorization::new("token", "https://org.crm4.dynamics.com/", 4_102_444_800);
    let operations = vec![
        BatchOperation::create("leads", row()),
        BatchOperation::update("leads(42)", row()),
    ];

    let expected = BatchRequestBuilder::with_seed(&auth.url, 9)
        .add_operations(operations.clone())
        .build()
        .unwrap();

    let outcome = client
        .batch(BatchRequestParams::new(&auth, operations).with_seed(9))
        .await
        .unwrap();

    assert_eq!(outcome.status, 200);
    let request = mock.last_request();
    assert_eq!(request.url, "https://org.crm4.dynamics.com/api/data/v9.1/$batch");
    assert_eq!(request.body.as_deref(), Some(expected.body.as_str()));
    assert_eq!(header(&request, "Content-Type"), Some("multipart/mixed;boundary=batch_AAA009"));
}

#[tokio::test]
async fn test_batch_without_trailing_slash() {
    let (mock, client) = setup();
    let auth = auth();

    client
        .batch(BatchRequestParams::new(&auth, vec![BatchOperation::create("leads", row())]).with_seed(4))
        .await
        .unwrap();

    let request = mock.last_request();
    assert_eq!(request.url, "https://org.crm4.dynamics.com/api/data/v9.1/$batch");
    let body = request.body.unwrap();
    assert!(body.contains("POST https://org.crm4.dynamics.com/api/data/v9.1/leads HTTP/1.1"));
    assert!(!body.contains(".comapi/"));
}

#[tokio::test]
async fn test_create_timeout_is_not_resent() {
    let mock = Arc::new(MockTransport::new());
    mock.push(Err(TransportError::new(RetryableError::Timeout, "operation timed out")));
    let client = DataverseClient::new(mock.clone());
    let auth = auth();

    let err = client
        .create_update(CreateUpdateRequest::create(&auth, "accounts", row()))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Transport(message) if message.contains("timed out")));
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn test_loopback_client_calls() {
    let (mock, client) = setup();
    let auth = Authorization::new("token", "fakeurl", 0);

    let record = client.retrieve(RetrieveRequest::new(&auth, "contacts", "1")).await.unwrap();
    assert_eq!(record["isfake"], true);

    let id = client.create_update(CreateUpdateRequest::create(&auth, "contacts", row())).await.unwrap();
    assert_eq!(id, "");

    client.delete(DeleteRequest::new(&auth, "contacts", "1")).await.unwrap();

    let outcome = client
        .batch(BatchRequestParams::new(&auth, vec![BatchOperation::create("leads", row())]))
        .await
        .unwrap();
    assert!(outcome.is_fake);

    assert_eq!(mock.calls(), 0);
}
