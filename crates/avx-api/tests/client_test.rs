#![allow(clippy::unwrap_used)]
// Integration tests for `ControllerClient` login and envelope handling using wiremock.

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use avx_api::{CloudType, ControllerClient, Error, Session, TagSet, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ControllerClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client =
        ControllerClient::with_session(reqwest::Client::new(), base_url, Session::new("cid-test"))
            .unwrap();
    (server, client)
}

fn vpc_tags() -> TagSet {
    TagSet::new(CloudType::Aws, "vpc", "vpc-0abc")
}

// ── Login ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_stamps_cid_on_later_calls() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/api"))
        .and(body_string_contains("action=login"))
        .and(body_string_contains("username=admin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "return": true,
            "CID": "session-42",
            "results": "User login:admin has been authorized successfully"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/api"))
        .and(query_param("action", "list_resource_tags"))
        .and(query_param("CID", "session-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "return": true,
            "results": {}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let password = SecretString::from("secret".to_owned());
    let client = ControllerClient::login(
        Url::parse(&server.uri()).unwrap(),
        "admin",
        &password,
        &TransportConfig::default(),
    )
    .await
    .unwrap();

    let mut tags = vpc_tags();
    let list = client.tags().list(&mut tags).await.unwrap();
    assert!(list.is_empty());
}

#[tokio::test]
async fn test_login_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/api"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "return": false,
            "reason": "Invalid username or password"
        })))
        .mount(&server)
        .await;

    let password = SecretString::from("wrong".to_owned());
    let result = ControllerClient::login(
        Url::parse(&server.uri()).unwrap(),
        "admin",
        &password,
        &TransportConfig::default(),
    )
    .await;

    match result {
        Err(Error::Authentication { ref message }) => {
            assert_eq!(message, "Invalid username or password");
        }
        Err(other) => panic!("expected Authentication error, got: {other:?}"),
        Ok(_) => panic!("expected Authentication error, got a client"),
    }
}

#[tokio::test]
async fn test_login_without_cid_fails() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/api"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "return": true })))
        .mount(&server)
        .await;

    let password = SecretString::from("secret".to_owned());
    let result = ControllerClient::login(
        Url::parse(&server.uri()).unwrap(),
        "admin",
        &password,
        &TransportConfig::default(),
    )
    .await;

    assert!(matches!(result, Err(Error::Authentication { .. })));
}

// ── Envelope ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_rejection_reason_is_verbatim() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/api"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "return": false,
            "reason": "Resource 'vpc-0abc' not found in account 'prod'."
        })))
        .mount(&server)
        .await;

    let err = client.tags().add(&vpc_tags()).await.unwrap_err();

    match err {
        Error::Api { action, reason } => {
            assert_eq!(action, "add_resource_tags");
            assert_eq!(reason, "Resource 'vpc-0abc' not found in account 'prod'.");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_unauthorized_is_authentication_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.tags().update(&vpc_tags()).await.unwrap_err();
    assert!(
        matches!(err, Error::Authentication { .. }),
        "expected Authentication error, got: {err:?}"
    );
}

#[tokio::test]
async fn test_server_error_is_http_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = client.devices().deregister("dev1").await.unwrap_err();
    match err {
        Error::Http { status, ref message } => {
            assert_eq!(status, 502);
            assert_eq!(message, "bad gateway");
            assert!(err.is_transient());
        }
        other => panic!("expected Http error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_non_json_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = client.tags().add(&vpc_tags()).await.unwrap_err();
    match err {
        Error::Deserialization { body, .. } => assert!(body.contains("maintenance")),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}
