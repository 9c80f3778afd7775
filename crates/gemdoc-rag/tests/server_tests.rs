//! HTTP surface tests driving the router in-process

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use common::{docx_bytes, pipeline, small_chunk_config, SCENARIO_TEXT};
use gemdoc_rag::config::RagConfig;
use gemdoc_rag::server::{build_router, state::AppState};

const BOUNDARY: &str = "gemdoc-test-boundary";

fn app() -> Router {
    app_with(small_chunk_config())
}

fn app_with(config: RagConfig) -> Router {
    let pipeline = Arc::new(pipeline(&config, None));
    let state = AppState::with_pipeline(config.clone(), pipeline);
    build_router(state, &config.server)
}

fn multipart_upload(path: &str, filename: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\n\
             Content-Type: {ct}\r\n\r\n",
            b = BOUNDARY,
            f = filename,
            ct = content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(path)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn json_request(method: &str, path: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_health() {
    let response = app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn test_status_before_upload() {
    let app = app();
    let (status, body) = send(&app, Request::get("/status/").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["has_index"], false);
    assert_eq!(body["chunks"], 0);
    assert_eq!(body["embedding_model"], "hash-v1-384");
}

#[tokio::test]
async fn test_ask_before_upload_is_not_found() {
    let app = app();
    let (status, body) = send(
        &app,
        json_request("POST", "/ask", serde_json::json!({ "query": "What is Alpha?" })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["type"], "empty_index");
    assert!(body["error"].as_str().unwrap().contains("upload a document"));
}

#[tokio::test]
async fn test_upload_text_file_rejected() {
    let app = app();
    let (status, body) = send(
        &app,
        multipart_upload("/upload", "notes.txt", "text/plain", b"Alpha concept."),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("notes.txt"));

    let (_, body) = send(&app, Request::get("/status").body(Body::empty()).unwrap()).await;
    assert_eq!(body["chunks"], 0);
}

#[tokio::test]
async fn test_text_file_declared_as_pdf_rejected() {
    let app = app();
    let (status, body) = send(
        &app,
        multipart_upload("/upload", "notes.txt", "application/pdf", b"Alpha concept."),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("Unsupported"));
}

#[tokio::test]
async fn test_upload_not_multipart() {
    let app = app();
    let (status, body) = send(
        &app,
        json_request("POST", "/upload", serde_json::json!({ "file": "x" })),
    )
    .await;

    assert!(status.is_client_error());
    assert_eq!(body["status"], "error");
    assert!(!body["message"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_over_size_limit() {
    let mut config = small_chunk_config();
    config.server.max_upload_size = 1024;
    let app = app_with(config);

    let (status, body) = send(
        &app,
        multipart_upload("/upload", "big.pdf", "application/pdf", &vec![b'x'; 8 * 1024]),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let app = app();
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nvalue\r\n--{b}--\r\n",
        b = BOUNDARY
    );
    let req = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_upload_then_ask() {
    let app = app();
    let docx = docx_bytes(&[SCENARIO_TEXT]);

    let (status, body) = send(
        &app,
        multipart_upload(
            "/upload/",
            "concepts.docx",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            &docx,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["status"], "ok");
    assert!(body["chunks"].as_u64().unwrap() >= 3);

    let (status, body) = send(&app, Request::get("/status").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["has_index"], true);
    assert_eq!(body["documents"], 1);

    let form = Request::builder()
        .method("POST")
        .uri("/ask/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("query=What+is+Alpha%3F&top_k=2"))
        .unwrap();
    let (status, body) = send(&app, form).await;
    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["kind"], "context_only");
    assert_eq!(body["sources"].as_array().unwrap().len(), 2);
    assert!(body["sources"][0]["snippet"]
        .as_str()
        .unwrap()
        .contains("Alpha concept"));

    let (status, body) = send(
        &app,
        json_request("POST", "/ask", serde_json::json!({ "question": "Gamma?", "top_k": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sources"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_ask_validation() {
    let app = app();

    let (status, body) =
        send(&app, json_request("POST", "/ask", serde_json::json!({ "query": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["type"], "empty_input");

    let (status, body) =
        send(&app, json_request("POST", "/ask", serde_json::json!({ "top_k": 3 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["type"], "bad_request");
}
