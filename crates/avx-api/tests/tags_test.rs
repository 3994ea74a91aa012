#![allow(clippy::unwrap_used)]
// Integration tests for `TagClient` using wiremock.

use std::collections::{HashMap, HashSet};

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use avx_api::{CloudType, ControllerClient, Session, TagSet};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ControllerClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client =
        ControllerClient::with_session(reqwest::Client::new(), base_url, Session::new("cid-test"))
            .unwrap();
    (server, client)
}

fn ok() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "return": true,
        "results": "Tags updated"
    }))
}

fn desired() -> HashMap<String, String> {
    HashMap::from([
        ("env".to_owned(), "prod".to_owned()),
        ("owner".to_owned(), "netops".to_owned()),
    ])
}

async fn mount_list(server: &MockServer, usr_tags: &HashMap<String, String>) {
    Mock::given(method("GET"))
        .and(path("/v1/api"))
        .and(query_param("action", "list_resource_tags"))
        .and(query_param("CID", "cid-test"))
        .and(query_param("cloud_type", "1"))
        .and(query_param("resource_type", "vpc"))
        .and(query_param("resource_name", "vpc-0abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "return": true,
            "results": {
                "usr_tags": usr_tags,
                "sys_tags": { "Aviatrix-Created-Resource": "Do-Not-Delete" }
            },
            "reason": ""
        })))
        .mount(server)
        .await;
}

// ── Add / list ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_add_sends_session_action_and_json_payload() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/api"))
        .and(body_string_contains("action=add_resource_tags"))
        .and(body_string_contains("CID=cid-test"))
        .and(body_string_contains("cloud_type=1"))
        .and(body_string_contains("resource_type=vpc"))
        .and(body_string_contains("resource_name=vpc-0abc"))
        .and(body_string_contains("new_tag_json="))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;

    let tags = TagSet::new(CloudType::Aws, "vpc", "vpc-0abc").with_tags(desired());
    client.tags().add(&tags).await.unwrap();
}

#[tokio::test]
async fn test_list_after_add_returns_added_pairs() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(body_string_contains("action=add_resource_tags"))
        .respond_with(ok())
        .mount(&server)
        .await;
    mount_list(&server, &desired()).await;

    let added = TagSet::new(CloudType::Aws, "vpc", "vpc-0abc").with_tags(desired());
    client.tags().add(&added).await.unwrap();

    let mut read = TagSet::new(CloudType::Aws, "vpc", "vpc-0abc");
    let list = client.tags().list(&mut read).await.unwrap();

    let got: HashSet<String> = list.into_iter().collect();
    let want: HashSet<String> = ["env:prod".to_owned(), "owner:netops".to_owned()].into();
    assert_eq!(got, want);
    assert_eq!(read.tags, desired());
}

#[tokio::test]
async fn test_list_without_user_tags_is_empty() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(query_param("action", "list_resource_tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "return": true,
            "results": { "sys_tags": { "created-by": "controller" } }
        })))
        .mount(&server)
        .await;

    let mut tags = TagSet::new(CloudType::Aws, "vpc", "vpc-0abc");
    let list = client.tags().list(&mut tags).await.unwrap();

    assert!(list.is_empty());
    assert!(tags.tags.is_empty());
}

#[tokio::test]
async fn test_list_without_results_is_empty() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "return": true })))
        .mount(&server)
        .await;

    let mut tags = TagSet::new(CloudType::Aws, "vpc", "vpc-0abc");
    assert!(client.tags().list(&mut tags).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_rejection_is_api_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "return": false,
            "reason": "Invalid resource type: vpx"
        })))
        .mount(&server)
        .await;

    let mut tags = TagSet::new(CloudType::Aws, "vpx", "vpc-0abc");
    let err = client.tags().list(&mut tags).await.unwrap_err();
    assert_eq!(err.reason(), Some("Invalid resource type: vpx"));
}

// ── Delete / update ─────────────────────────────────────────────────

#[tokio::test]
async fn test_delete_then_list_omits_deleted_keys() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(body_string_contains("action=delete_resource_tag"))
        .and(body_string_contains("del_tag_list=owner"))
        .and(body_string_contains("CID=cid-test"))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;
    let remaining = HashMap::from([("env".to_owned(), "prod".to_owned())]);
    mount_list(&server, &remaining).await;

    let delete = TagSet::new(CloudType::Aws, "vpc", "vpc-0abc").with_tag_list(["owner"]);
    client.tags().delete(&delete).await.unwrap();

    let mut read = TagSet::new(CloudType::Aws, "vpc", "vpc-0abc");
    let list = client.tags().list(&mut read).await.unwrap();
    assert!(list.iter().all(|entry| !entry.starts_with("owner:")));
    assert!(!read.tags.contains_key("owner"));
}

#[tokio::test]
async fn test_update_uses_update_action() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(body_string_contains("action=update_resource_tags"))
        .and(body_string_contains("new_tag_json="))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;

    let tags = TagSet::new(CloudType::Aws, "vpc", "vpc-0abc").with_tags(desired());
    client.tags().update(&tags).await.unwrap();
}
