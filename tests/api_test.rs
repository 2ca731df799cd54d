//! Router tests driven through `tower::ServiceExt::oneshot`

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use elohim_ipfs::api::{create_router, rpc_path, DEFAULT_MAX_MESSAGE_BYTES};
use elohim_ipfs::{IpfsService, MemoryClient};

fn app() -> Router {
    let client = Arc::new(MemoryClient::new("https://ipfs.io/ipfs"));
    create_router(Arc::new(IpfsService::new(client)), DEFAULT_MAX_MESSAGE_BYTES)
}

async fn call(app: Router, method: &str, body: Value) -> (StatusCode, Value) {
    call_raw(app, method, "application/json", &body.to_string()).await
}

#[tokio::test]
async fn test_health() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn test_empty_upload_is_bad_request() {
    let (status, body) = call(app(), "UploadContent", json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_argument");
    assert_eq!(body["message"], "data is required");
}

#[tokio::test]
async fn test_unknown_cid_is_not_found() {
    let (status, body) = call(app(), "GetContent", json!({ "cid": "QmMissing" })).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_upload_then_fetch() {
    let app = app();

    // "hello world"
    let (status, uploaded) = call(
        app.clone(),
        "UploadContent",
        json!({ "data": "aGVsbG8gd29ybGQ=", "filename": "hello.txt" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(uploaded["cid"], "QmaozNR7DZHQK1ZcU9p7QdrshMvXqWK6gpu5rmrkPdT3L4");
    assert_eq!(uploaded["size_bytes"], 11);

    let (status, fetched) = call(
        app.clone(),
        "GetContent",
        json!({ "cid": uploaded["cid"] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["data"], "aGVsbG8gd29ybGQ=");
    assert_eq!(fetched["size_bytes"], 11);

    let (status, pinned) = call(app.clone(), "PinContent", json!({ "cid": uploaded["cid"] })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pinned["success"], true);

    let (status, url) = call(app, "GetGatewayURL", json!({ "cid": uploaded["cid"] })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        url["url"],
        "https://ipfs.io/ipfs/QmaozNR7DZHQK1ZcU9p7QdrshMvXqWK6gpu5rmrkPdT3L4"
    );
}

#[tokio::test]
async fn test_upload_proto_round_trip() {
    let app = app();

    let (status, uploaded) = call(
        app.clone(),
        "UploadProto",
        json!({ "proto_data": "CgRib29r", "proto_type": "alexandria.Book" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(uploaded["size_bytes"], 6);

    let (status, fetched) = call(app, "GetProto", json!({ "cid": uploaded["cid"] })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["proto_data"], "CgRib29r");
}

#[tokio::test]
async fn test_body_limit_enforced() {
    let client = Arc::new(MemoryClient::default());
    let app = create_router(Arc::new(IpfsService::new(client)), 64);

    let (status, body) = call(
        app,
        "UploadContent",
        json!({ "data": "A".repeat(256), "filename": "big" }),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["code"], "resource_exhausted");
}

async fn call_raw(app: Router, method: &str, content_type: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(rpc_path(method))
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_malformed_json_uses_error_body() {
    let (status, body) = call_raw(app(), "GetContent", "application/json", "{not json").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_argument");
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
}

#[tokio::test]
async fn test_invalid_base64_uses_error_body() {
    let (status, body) = call_raw(
        app(),
        "UploadContent",
        "application/json",
        r#"{"data": "***not base64***"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_argument");
}

#[tokio::test]
async fn test_missing_content_type_uses_error_body() {
    let (status, body) = call_raw(app(), "PinContent", "text/plain", r#"{"cid": "QmA"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_argument");
}
