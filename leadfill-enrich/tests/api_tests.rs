//! HTTP API integration tests
//!
//! Drives the full router with `oneshot` requests. Lookups are served by an
//! in-process stub strategy, and outputs go to a per-test temp directory.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use leadfill_enrich::config::EnrichConfig;
use leadfill_enrich::models::{ContactFragment, ContactQuery};
use leadfill_enrich::resolver::{LookupStrategy, PolicyConfig, ResolutionPolicy, StrategyError};
use leadfill_enrich::{build_router, AppState};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "leadfill-test-boundary";

/// Knows a single listing: MLS number A1
struct StubDirectory;

#[async_trait]
impl LookupStrategy for StubDirectory {
    fn name(&self) -> &str {
        "stub_directory"
    }

    fn can_attempt(&self, query: &ContactQuery) -> bool {
        query.identifier.is_some()
    }

    async fn lookup(&self, query: &ContactQuery) -> Result<ContactFragment, StrategyError> {
        if query.identifier.as_deref() == Some("A1") {
            Ok(ContactFragment::new(
                Some("agent@example.com".to_string()),
                Some("555-0100".to_string()),
            ))
        } else {
            Ok(ContactFragment::default())
        }
    }
}

/// Router plus the temp dir backing its output store
fn test_app() -> (Router, TempDir) {
    test_app_with(EnrichConfig::default())
}

fn test_app_with(config: EnrichConfig) -> (Router, TempDir) {
    let output_dir = tempfile::tempdir().unwrap();
    let config = EnrichConfig {
        output_dir: output_dir.path().to_path_buf(),
        ..config
    };
    let policy = ResolutionPolicy::new(
        vec![Arc::new(StubDirectory)],
        &PolicyConfig {
            retry_delay_ms: 0,
            ..Default::default()
        },
    );
    (build_router(AppState::new(config, policy)), output_dir)
}

fn multipart_body(field: &str, file_name: &str, contents: &str) -> String {
    format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
         Content-Type: text/csv\r\n\
         \r\n\
         {contents}\r\n\
         --{b}--\r\n",
        b = BOUNDARY,
    )
}

fn upload_request(uri: &str, field: &str, contents: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(field, "leads.csv", contents)))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn stored_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

const LEADS_CSV: &str = "MLS Number,First Name,Last Name\n\
                         A1,Jane,Doe\n\
                         B2,John,Roe\n\
                         ,,\n";

#[tokio::test]
async fn root_serves_upload_form() {
    let (app, _dir) = test_app();

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.contains("text/html"));
    let html = body_text(response).await;
    assert!(html.contains("enctype=\"multipart/form-data\""));
    assert!(html.contains("name=\"file\""));
}

#[tokio::test]
async fn enrich_returns_csv_and_removes_file() {
    let (app, dir) = test_app();

    let response = app
        .oneshot(upload_request("/enrich", "file", LEADS_CSV))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/csv"));
    let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(disposition.starts_with("attachment; filename=\"enriched_"));

    let csv = body_text(response).await;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "MLS Number,First Name,Last Name,Enriched Agent Email,Enriched Agent Phone,Lookup Source,Lookup Status"
    );
    assert_eq!(lines[1], "A1,Jane,Doe,agent@example.com,555-0100,stub_directory,ok");
    assert_eq!(lines[2], "B2,John,Roe,,,,no_match");
    assert!(lines[3].ends_with(",skipped"));
    assert_eq!(lines.len(), 4);

    assert_eq!(stored_files(dir.path()), 0, "Output should be deleted once sent");
}

#[tokio::test]
async fn enrich_rejects_missing_columns() {
    let (app, dir) = test_app();

    let response = app
        .oneshot(upload_request("/enrich", "file", "Name,Phone\nJane,1\n"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
    let message = json["error"].as_str().unwrap();
    assert!(message.contains("MLS Number"), "unexpected message: {}", message);
    assert_eq!(stored_files(dir.path()), 0);
}

#[tokio::test]
async fn enrich_rejects_empty_upload() {
    let (app, _dir) = test_app();

    let response = app
        .oneshot(upload_request("/enrich", "file", ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let (app, dir) = test_app_with(EnrichConfig {
        max_upload_bytes: 512,
        ..Default::default()
    });
    let mut csv = String::from("MLS Number,First Name,Last Name\n");
    for i in 0..200 {
        csv.push_str(&format!("ML{},Jane,Doe\n", i));
    }

    let response = app
        .oneshot(upload_request("/enrich", "file", &csv))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert!(json["error"].is_string());
    assert_eq!(stored_files(dir.path()), 0);
}

#[tokio::test]
async fn enrich_requires_file_field() {
    let (app, _dir) = test_app();

    let response = app
        .oneshot(upload_request("/enrich", "attachment", LEADS_CSV))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert!(json["error"].as_str().unwrap().contains("'file'"));
}

#[tokio::test]
async fn form_upload_links_download_once() {
    let (app, dir) = test_app();

    let response = app
        .clone()
        .oneshot(upload_request("/", "file", LEADS_CSV))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Enrichment Complete"));
    assert!(html.contains("3 rows: 1 matched, 1 not found, 1 skipped, 0 unreadable"));

    let start = html.find("/download/").unwrap();
    let end = start + html[start..].find('"').unwrap();
    let link = html[start..end].to_string();
    assert_eq!(stored_files(dir.path()), 1);

    let response = app
        .clone()
        .oneshot(Request::builder().uri(&link).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let csv = body_text(response).await;
    assert!(csv.contains("agent@example.com"));
    assert_eq!(stored_files(dir.path()), 0);

    // Second download of the same link finds nothing
    let response = app
        .oneshot(Request::builder().uri(&link).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn download_unknown_file_is_not_found() {
    let (app, _dir) = test_app();

    for uri in [
        "/download/enriched_0123456789abcdef0123456789abcdef.csv",
        "/download/secrets.txt",
    ] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
        let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert!(json["error"].as_str().unwrap().contains("not found"));
    }
}

#[tokio::test]
async fn health_reports_strategies() {
    let (app, _dir) = test_app();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "leadfill-enrich");
    assert_eq!(json["strategies"], serde_json::json!(["stub_directory"]));
    assert!(json.get("last_error").is_none());
}
