//! Integration tests for the Vault client against a mock server

use pretty_assertions::assert_eq;
use serde_json::json;
use vaultsubst::{ClientBuilder, Error, ErrorKind, KvReader, Patcher};
use wiremock::{
    matchers::{header, header_exists, method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Create a mock server and test client
async fn setup() -> (MockServer, vaultsubst::Client) {
    let server = MockServer::start().await;

    let client = ClientBuilder::new(server.uri())
        .token("test-token")
        .timeout_ms(5000)
        .build()
        .expect("Failed to build client");

    (server, client)
}

fn kv2_body(data: serde_json::Value) -> serde_json::Value {
    json!({
        "request_id": "b4a0d3c1",
        "lease_id": "",
        "renewable": false,
        "lease_duration": 0,
        "data": {
            "data": data,
            "metadata": {
                "created_time": "2024-01-01T00:00:00Z",
                "deletion_time": "",
                "destroyed": false,
                "version": 3
            }
        }
    })
}

#[tokio::test]
async fn test_patch_buffer_against_kv2() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/kv/data/storage/postgres/creds"))
        .and(header("X-Vault-Token", "test-token"))
        .and(header_exists("X-Request-ID"))
        .respond_with(ResponseTemplate::new(200).set_body_json(kv2_body(json!({
            "username": "ICBwb3N0Z3JlcyAg",
            "password": "hunter2"
        }))))
        .expect(2)
        .mount(&server)
        .await;

    let input = "\
user: @@path=kv/storage/postgres/creds,field=username,b64=true,transform=trim|upper@@
password: @@path=kv/storage/postgres/creds,field=password@@
";
    let output = Patcher::new("@@")
        .unwrap()
        .patch(input, &client)
        .await
        .unwrap();

    assert_eq!(output, "user: POSTGRES\npassword: hunter2\n");
}

#[tokio::test]
async fn test_kv1_mount() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/secret/legacy/app"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "lease_duration": 2764800,
            "data": {"api_key": "abc123"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let value = client
        .resolve("path=secret/legacy/app,field=api_key,ver=v1,transform=base64")
        .await
        .unwrap();
    assert_eq!(value, "YWJjMTIz");
}

#[tokio::test]
async fn test_missing_secret() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/kv/data/nope"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"errors": []})))
        .mount(&server)
        .await;

    assert!(client.read_kv_v2("kv", "nope").await.unwrap().is_none());

    let err = client
        .patch("x=@@path=kv/nope,field=a@@", "@@")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NilSecret));
}

#[tokio::test]
async fn test_server_error_message() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/kv/data/app"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_json(json!({"errors": ["1 error occurred", "permission denied"]}))
                .append_header("X-Request-ID", "req-403"),
        )
        .mount(&server)
        .await;

    let err = client.resolve("path=kv/app,field=a").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(err.status_code(), Some(403));
    assert_eq!(err.request_id(), Some("req-403"));
    assert_eq!(
        err.to_string(),
        "http 403: 1 error occurred; permission denied (req=Some(\"req-403\"))"
    );
}

#[tokio::test]
async fn test_server_error_without_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/kv/data/app"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client.read_kv_v2("kv", "app").await.unwrap_err();
    match err {
        Error::Http {
            status, message, ..
        } => {
            assert_eq!(status, 503);
            assert_eq!(message, "HTTP error 503");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/kv/data/app"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client.read_kv_v2("kv", "app").await.unwrap_err();
    assert!(matches!(err, Error::Deserialize(_)));
}

#[tokio::test]
async fn test_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(kv2_body(json!({"a": "b"})))
                .set_delay(std::time::Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = ClientBuilder::new(server.uri())
        .token("test-token")
        .timeout_ms(50)
        .build()
        .unwrap();

    let err = client.read_kv_v2("kv", "slow").await.unwrap_err();
    assert!(matches!(err, Error::Timeout));
}

#[tokio::test]
async fn test_encoded_sub_path() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/kv/data/team%20a/db"))
        .respond_with(ResponseTemplate::new(200).set_body_json(kv2_body(json!({"user": "u"}))))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(
        client.resolve("path=kv/team a/db,field=user").await.unwrap(),
        "u"
    );
}

#[tokio::test]
async fn test_user_agent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header(
            "user-agent",
            format!("vaultsubst/{} ci", vaultsubst::VERSION).as_str(),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(kv2_body(json!({"a": "b"}))))
        .expect(1)
        .mount(&server)
        .await;

    let client = ClientBuilder::new(server.uri())
        .token("test-token")
        .user_agent_extra("ci")
        .build()
        .unwrap();

    assert_eq!(client.resolve("path=kv/x,field=a").await.unwrap(), "b");
}
