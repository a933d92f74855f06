use std::time::Duration;

use bytes::Bytes;
use httpmock::MockServer;
use url::Url;
use valet::{
    application::{artifacts::HTML_CONTENT_TYPE, storage::ObjectStore, storage::StorageError},
    config::StorageSettings,
    infra::storage::S3ObjectStore,
};

const BUCKET: &str = "valet-test";

fn settings(endpoint: &str) -> StorageSettings {
    StorageSettings {
        bucket: BUCKET.to_string(),
        region: "us-east-1".to_string(),
        endpoint_url: Some(Url::parse(endpoint).expect("endpoint url")),
        public_base_url: Url::parse("https://static.example.org").expect("public base"),
        timeout: Duration::from_secs(5),
        force_path_style: true,
        access_key_id: Some("test-access-key".to_string()),
        secret_access_key: Some("test-secret-key".to_string()),
    }
}

#[tokio::test]
async fn put_sends_public_read_acl_content_type_and_length() {
    let server = MockServer::start_async().await;
    let payload = Bytes::from_static(b"<!doctype html><html></html>");
    let mock = server
        .mock_async(|when, then| {
            when.method("PUT")
                .path(format!("/{BUCKET}/alice/popcorn/16"))
                .header("x-amz-acl", "public-read")
                .header("content-type", HTML_CONTENT_TYPE)
                .header("content-length", payload.len().to_string())
                .body("<!doctype html><html></html>");
            then.status(200);
        })
        .await;

    let store = S3ObjectStore::connect(&settings(&server.base_url()))
        .await
        .expect("client builds");
    store
        .put_object("alice/popcorn/16", payload.clone(), HTML_CONTENT_TYPE)
        .await
        .expect("upload accepted");

    mock.assert_async().await;
}

#[tokio::test]
async fn error_status_is_reported_once_without_retry() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method("PUT").path(format!("/{BUCKET}/alice/popcorn/16_"));
            then.status(503);
        })
        .await;

    let store = S3ObjectStore::connect(&settings(&server.base_url()))
        .await
        .expect("client builds");
    let err = store
        .put_object(
            "alice/popcorn/16_",
            Bytes::from_static(b"<html></html>"),
            HTML_CONTENT_TYPE,
        )
        .await
        .expect_err("503 is a failure");

    assert_eq!(err, StorageError::Status { status: 503 });
    assert_eq!(mock.hits_async().await, 1);
}

#[tokio::test]
async fn success_statuses_other_than_200_are_failures() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method("PUT").path(format!("/{BUCKET}/alice/popcorn/16/edit"));
            then.status(204);
        })
        .await;

    let store = S3ObjectStore::connect(&settings(&server.base_url()))
        .await
        .expect("client builds");
    let err = store
        .put_object(
            "alice/popcorn/16/edit",
            Bytes::from_static(b"<html></html>"),
            HTML_CONTENT_TYPE,
        )
        .await
        .expect_err("only 200 counts as stored");

    assert_eq!(err, StorageError::Status { status: 204 });
    assert_eq!(mock.hits_async().await, 1);
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
    // Bind then drop a listener so the port is known to be closed.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let store = S3ObjectStore::connect(&settings(&format!("http://{addr}")))
        .await
        .expect("client builds");
    let err = store
        .put_object("alice/popcorn/16", Bytes::from_static(b"x"), HTML_CONTENT_TYPE)
        .await
        .expect_err("nothing listening");

    assert!(matches!(err, StorageError::Transport { .. }), "{err:?}");
    assert_eq!(err.status(), None);
}
