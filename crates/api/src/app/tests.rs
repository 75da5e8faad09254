//! Router-level tests: the HTTP contract end-to-end against scripted
//! collaborators (no network, hand-cranked scheduler).

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use pdfrelay_conversion::testing::{ManualScheduler, ScriptedClient};
use pdfrelay_conversion::{ConversionConfig, ConversionState, InMemoryStatusCache, StatusCache};
use pdfrelay_core::{AttachmentId, UserId};

use crate::app::build_router;
use crate::app::services::AppServices;
use crate::middleware::VIEWER_HEADER;

const BOUNDARY: &str = "pdfrelay-test-boundary";

struct TestApp {
    app: Router,
    client: Arc<ScriptedClient>,
    scheduler: Arc<ManualScheduler>,
    services: Arc<AppServices>,
}

fn config() -> ConversionConfig {
    ConversionConfig::new(
        "http://convert.example/convert",
        "http://app.example/conversion/callback",
        b"api-test-signing-key".to_vec(),
    )
}

fn test_app(client: ScriptedClient) -> TestApp {
    let client = Arc::new(client);
    let scheduler = ManualScheduler::arc();
    let cache = InMemoryStatusCache::arc();
    let services = Arc::new(AppServices::new(
        config(),
        client.clone(),
        scheduler.clone(),
        cache,
    ));
    let app = build_router(services.clone());
    TestApp { app, client, scheduler, services }
}

async fn read_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    read_json(app.clone().oneshot(request).await.unwrap()).await
}

async fn post_multipart(app: &Router, uri: &str, body: Vec<u8>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    read_json(app.clone().oneshot(request).await.unwrap()).await
}

async fn get(app: &Router, uri: &str, viewer: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(viewer) = viewer {
        builder = builder.header(VIEWER_HEADER, viewer);
    }
    let request = builder.body(Body::empty()).unwrap();
    read_json(app.clone().oneshot(request).await.unwrap()).await
}

fn text_part(out: &mut Vec<u8>, name: &str, value: &str) {
    out.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    out.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
    );
    out.extend_from_slice(value.as_bytes());
    out.extend_from_slice(b"\r\n");
}

fn file_part(out: &mut Vec<u8>, name: &str, filename: &str, content_type: &str, data: &[u8]) {
    out.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    out.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    out.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    out.extend_from_slice(data);
    out.extend_from_slice(b"\r\n");
}

fn close_body(out: &mut Vec<u8>) {
    out.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
}

fn upload_body(folder: &str, owner: &str, title: &str, filename: &str) -> Vec<u8> {
    let mut body = Vec::new();
    text_part(&mut body, "folder", folder);
    text_part(&mut body, "owner", owner);
    text_part(&mut body, "title", title);
    file_part(&mut body, "file", filename, "application/msword", b"doc-bytes");
    close_body(&mut body);
    body
}

fn callback_body(token: &str, status: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    text_part(&mut body, "directory", token);
    text_part(&mut body, "status", status);
    file_part(&mut body, "content", "converted.pdf", "application/pdf", content);
    close_body(&mut body);
    body
}

#[tokio::test]
async fn health_answers() {
    let t = test_app(ScriptedClient::accepting());
    let (status, _) = get(&t.app, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn full_pipeline_from_upload_to_finished_poll() {
    let t = test_app(ScriptedClient::accepting());
    let owner = UserId::new().to_string();

    // Create a folder and upload a source document into it.
    let (status, folder) = post_json(&t.app, "/folders", json!({ "title": "Docs" })).await;
    assert_eq!(status, StatusCode::CREATED);
    let folder_id = folder["id"].as_str().unwrap().to_string();

    let (status, uploaded) = post_multipart(
        &t.app,
        "/attachments",
        upload_body(&folder_id, &owner, "Report", "справка 2024.docx"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = uploaded["id"].as_i64().unwrap();

    // Kick off conversion; the poller sees it pending.
    let (status, _) = post_json(&t.app, &format!("/attachments/{id}/convert"), json!({})).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (_, report) = get(&t.app, &format!("/conversion/check?a={id}"), None).await;
    assert_eq!(report["pending"], json!([id]));
    assert_eq!(report["finished"], json!([]));

    // Run the scheduled attempt; the wire request matches the contract.
    t.scheduler.run_next().await.unwrap();
    let request = t.client.requests().remove(0);
    assert_eq!(request.converter, "pdf");
    assert_eq!(request.file.filename, "_2024.docx");

    // The service calls back with the converted bytes.
    let (status, ack) = post_multipart(
        &t.app,
        "/conversion/callback",
        callback_body(&request.correlation_token, "1", b"%PDF-1.7"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack, json!({ "success": true }));

    // Poll again: finished, with a rendered container.
    let (_, report) = get(&t.app, &format!("/conversion/check?a={id}"), None).await;
    assert_eq!(report["finished"], json!([id]));
    assert_eq!(report["pending"], json!([]));
    let container = report["containers"][id.to_string()].as_str().unwrap();
    assert!(container.contains("Report"));
}

#[tokio::test]
async fn callback_with_a_bad_token_reports_failure_politely() {
    let t = test_app(ScriptedClient::accepting());

    let (status, ack) = post_multipart(
        &t.app,
        "/conversion/callback",
        callback_body("not-a-real-token", "1", b"pdf"),
    )
    .await;

    // HTTP-level success, contract-level failure.
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack, json!({ "success": false }));
}

#[tokio::test]
async fn callback_missing_fields_is_a_bad_request() {
    let t = test_app(ScriptedClient::accepting());

    let mut body = Vec::new();
    text_part(&mut body, "status", "1");
    close_body(&mut body);

    let (status, _) = post_multipart(&t.app, "/conversion/callback", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn check_rejects_malformed_ids() {
    let t = test_app(ScriptedClient::accepting());
    let (status, _) = get(&t.app, "/conversion/check?a=nope", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn restricted_containers_follow_the_viewer_identity() {
    let t = test_app(ScriptedClient::accepting());
    let insider = UserId::new();

    let (_, folder) = post_json(
        &t.app,
        "/folders",
        json!({ "title": "Internal", "restricted_to": [insider.to_string()] }),
    )
    .await;
    let folder_id = folder["id"].as_str().unwrap().to_string();

    let (_, uploaded) = post_multipart(
        &t.app,
        "/attachments",
        upload_body(&folder_id, &insider.to_string(), "Secret", "secret.docx"),
    )
    .await;
    let id = uploaded["id"].as_i64().unwrap();

    t.services
        .cache
        .set(AttachmentId::new(id), ConversionState::Finished, None)
        .await
        .unwrap();

    // Anonymous poller learns completion but gets no container.
    let (_, report) = get(&t.app, &format!("/conversion/check?a={id}"), None).await;
    assert_eq!(report["finished"], json!([id]));
    assert!(report["containers"].as_object().unwrap().is_empty());

    // The listed viewer gets the rendered fragment.
    let (_, report) = get(
        &t.app,
        &format!("/conversion/check?a={id}"),
        Some(&insider.to_string()),
    )
    .await;
    assert!(report["containers"][id.to_string()].is_string());

    // A malformed identity header is rejected outright.
    let (status, _) = get(&t.app, &format!("/conversion/check?a={id}"), Some("not-a-uuid")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn converting_a_missing_attachment_is_not_found() {
    let t = test_app(ScriptedClient::accepting());
    let (status, _) = post_json(&t.app, "/attachments/999/convert", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
