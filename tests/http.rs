//! HTTP surface tests driven through the router without a socket.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use vizpilot::agents::ProposalAgent;
use vizpilot::config::{Config, PipelineConfig};
use vizpilot::{create_router, AppState, Pipeline};

const BOUNDARY: &str = "vizpilot-test-boundary";

fn app() -> axum::Router {
    let pipeline = Pipeline::new(ProposalAgent::fallback_only(), None, PipelineConfig::default());
    create_router(AppState::new(Config::default(), pipeline))
}

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a [u8]),
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(filename, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

async fn post_upload(parts: &[Part<'_>]) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get_json(uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_upload_returns_widgets_and_preview() {
    let csv = b"date,region,revenue\n2024-01-01,north,10\n2024-01-02,south,12.5\n";
    let (status, body) = post_upload(&[
        Part::Text("domain", "retail"),
        Part::Text("intent", "track revenue"),
        Part::File("sales.csv", csv),
    ])
    .await;

    assert_eq!(status, StatusCode::OK, "unexpected body: {}", body);
    assert_eq!(body["domain"], "retail");
    assert_eq!(body["intent"], "track revenue");
    assert_eq!(body["format"], "CSV/TXT");
    assert_eq!(body["proposal_source"], "fallback");
    assert!(body["dataset_id"].as_str().is_some_and(|id| !id.is_empty()));

    let widgets = body["widgets"].as_array().unwrap();
    assert_eq!(widgets.len(), 2);
    assert_eq!(widgets[0]["type"], "line_chart");
    assert_eq!(widgets[0]["chart_document"]["$schema"], "https://vega.github.io/schema/vega-lite/v5.json");
    assert_eq!(widgets[0]["chart_document"]["data"]["name"], "preview");
    assert_eq!(widgets[1]["type"], "bar_chart");

    let preview = body["preview"].as_array().unwrap();
    assert_eq!(preview.len(), 2);
    assert_eq!(preview[1]["revenue"], serde_json::json!(12.5));
}

#[tokio::test]
async fn test_missing_intent_is_bad_request() {
    let (status, body) = post_upload(&[
        Part::Text("domain", "retail"),
        Part::File("sales.csv", b"a,b\n1,2\n"),
    ])
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");
    assert!(body["detail"].as_str().unwrap().contains("intent"));
}

#[tokio::test]
async fn test_missing_file_is_bad_request() {
    let (status, body) = post_upload(&[
        Part::Text("domain", "retail"),
        Part::Text("intent", "anything"),
    ])
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("file"));
}

#[tokio::test]
async fn test_unsupported_extension_is_bad_request() {
    let (status, body) = post_upload(&[
        Part::Text("domain", "retail"),
        Part::Text("intent", "anything"),
        Part::File("slides.pptx", b"binary"),
    ])
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "unsupported_format");
    assert!(body["detail"].as_str().unwrap().contains(".pptx"));
}

#[tokio::test]
async fn test_empty_column_is_validation_error() {
    let (status, body) = post_upload(&[
        Part::Text("domain", "retail"),
        Part::Text("intent", "anything"),
        Part::File("gaps.csv", b"a,b\n1,\n2,NA\n"),
    ])
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["detail"], "File contains empty columns: b");
}

#[tokio::test]
async fn test_health_and_version() {
    let (status, body) = get_json("/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["llm"], "mock");

    let (status, body) = get_json("/api/version").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "vizpilot");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
