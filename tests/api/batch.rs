use dataverse_client::api::operations::batch::encode;
use dataverse_client::api::{ApiError, BatchOperation, BatchRequestBuilder, BatchResponseParser};
use rand::SeedableRng;
use rand::rngs::StdRng;
use reqwest::Method;
use serde::Serialize;

#[derive(Serialize)]
struct Lead {
    lastname: String,
    firstname: String,
    companyname: String,
}

fn leads(count: usize) -> Vec<BatchOperation> {
    (1..=count)
        .map(|i| {
            let lead = Lead {
                lastname: format!("User{}", i),
                firstname: "Test".to_string(),
                companyname: "Test corp 1".to_string(),
            };
            BatchOperation::from_serializable(Method::POST, "leads", &lead).unwrap()
        })
        .collect()
}

#[test]
fn test_changeset_layout() {
    let batch = BatchRequestBuilder::with_seed("https://org.crm4.dynamics.com/", 42)
        .add_operations(leads(3))
        .build()
        .unwrap();

    let lines: Vec<&str> = batch.body.lines().collect();
    assert_eq!(lines[0], "--batch_AAA0042");
    assert_eq!(lines[1], "Content-Type: multipart/mixed;boundary=changeset_BBB0042");
    assert_eq!(lines.iter().filter(|l| **l == "--changeset_BBB0042").count(), 3);
    assert_eq!(
        lines.iter().filter(|l| **l == "POST https://org.crm4.dynamics.com/api/data/v9.1/leads HTTP/1.1").count(),
        3
    );
    assert!(batch.body.contains(r#""lastname":"User2""#));
    assert!(batch.body.ends_with("--changeset_BBB0042--\n\n--batch_AAA0042--"));
}

#[test]
fn test_boundary_from_seeded_rng() {
    let mut rng = StdRng::seed_from_u64(7);
    let batch = BatchRequestBuilder::with_rng("https://x/", &mut rng)
        .add_operations(leads(1))
        .build()
        .unwrap();

    let discriminator: u32 = batch.boundary.trim_start_matches("batch_AAA00").parse().unwrap();
    assert!(discriminator < 100);
    assert_eq!(batch.changeset, format!("changeset_BBB00{}", discriminator));
}

#[test]
fn test_encode_helper() {
    let (body, boundary) = encode("https://x/", &leads(2)).unwrap();
    assert!(boundary.starts_with("batch_AAA00"));
    assert_eq!(body.matches("Content-ID: ").count(), 2);
}

#[test]
fn test_unserializable_payload() {
    let err = BatchOperation::from_serializable(Method::POST, "leads", &"just a string").unwrap_err();
    assert!(matches!(err, ApiError::Encoding(_)));
}

#[test]
fn test_decode_response_items() {
    let response = "--batchresponse_1d2c\r
Content-Type: multipart/mixed; boundary=changesetresponse_9f8e\r
\r
--changesetresponse_9f8e\r
Content-Type: application/http\r
Content-Transfer-Encoding: binary\r
Content-ID: 0\r
\r
HTTP/1.1 204 No Content\r
OData-EntityId: https://org.crm4.dynamics.com/api/data/v9.1/leads(00000000-0000-0000-0000-000000000001)\r
\r
\r
--changesetresponse_9f8e\r
Content-Type: application/http\r
Content-Transfer-Encoding: binary\r
Content-ID: 1\r
\r
HTTP/1.1 412 Precondition Failed\r
Content-Type: application/json; odata.metadata=minimal\r
\r
{\"error\":{\"code\":\"0x80060882\",\"message\":\"Record already exists\"}}\r
--changesetresponse_9f8e--\r
--batchresponse_1d2c--\r
";

    let items = BatchResponseParser::parse(response).unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].content_id, Some(0));
    assert!(items[0].is_success);
    assert_eq!(items[1].status_code, 412);
    assert_eq!(
        items[1].error_message().as_deref(),
        Some("Dataverse Error [0x80060882]: Record already exists")
    );
    assert_eq!(items[1].json().unwrap()["error"]["code"], "0x80060882");
}
