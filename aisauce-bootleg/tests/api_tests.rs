//! HTTP routing tests

mod helpers;

use aisauce_bootleg::db::init_database_pool;
use aisauce_bootleg::models::{DownloadRecord, DownloadStatus};
use aisauce_bootleg::services::cleanup::DisabledCleaner;
use aisauce_bootleg::workflow::{BatchRunner, DownloadQueue};
use aisauce_bootleg::{build_router, AppState};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use helpers::{test_pipeline, FakeDownloader};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const TRACK_URL: &str = "https://soundcloud.com/izuk/one";

/// Router with a temporary database and a worker backed by fakes
async fn test_app() -> (tempfile::TempDir, Router) {
    test_app_with(FakeDownloader::new()).await
}

async fn test_app_with(downloader: FakeDownloader) -> (tempfile::TempDir, Router) {
    let dir = tempfile::tempdir().unwrap();
    let db = init_database_pool(&dir.path().join("bootleg.db")).await.unwrap();

    let downloader = Arc::new(downloader.with_track(TRACK_URL, &[("TITLE", "One"), ("ARTIST", "IZUK")]));
    let pipeline = test_pipeline(
        &dir.path().join("inbox"),
        &dir.path().join("tmp"),
        downloader,
        Arc::new(DisabledCleaner),
    );
    let runner = Arc::new(BatchRunner::new(Arc::new(pipeline), Arc::new(db.clone())));
    let (queue, _worker) = DownloadQueue::start(runner, Duration::from_secs(30));

    (dir, build_router(AppState::new(db, queue)))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_reports_module() {
    let (_dir, app) = test_app().await;
    let (status, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "bootleg");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_create_download_is_accepted_and_completes() {
    let (_dir, app) = test_app().await;

    let (status, body) = send(&app, post_json("/downloads", json!({ "url": TRACK_URL }))).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["total_tracks"], 1);
    let id = body["id"].as_str().unwrap().to_string();

    // Poll until the worker is done
    let mut record: Option<DownloadRecord> = None;
    for _ in 0..100 {
        let (status, body) = send(&app, get(&format!("/downloads/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        let current: DownloadRecord = serde_json::from_value(body).unwrap();
        if current.status.is_terminal() {
            record = Some(current);
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let record = record.expect("download should finish");
    assert_eq!(record.status, DownloadStatus::Completed);
    assert_eq!(record.title, "[sc] IZUK - One");
    assert_eq!(record.finished_tracks, 1);

    let (status, body) = send(&app, get("/downloads")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_download_rejects_blank_url() {
    let (_dir, app) = test_app().await;
    let (status, body) = send(&app, post_json("/downloads", json!({ "url": "   " }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_unknown_download_is_not_found() {
    let (_dir, app) = test_app().await;
    let (status, body) = send(&app, get(&format!("/downloads/{}", uuid::Uuid::new_v4()))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_malformed_id_is_client_error() {
    let (_dir, app) = test_app().await;
    let response = app.oneshot(get("/downloads/not-a-uuid")).await.unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_rejected_download_is_not_left_pending() {
    // Worker stays busy on the first job for the whole test
    let (_dir, app) = test_app_with(FakeDownloader::new().with_delay(Duration::from_secs(3600))).await;

    let mut rejected = None;
    for _ in 0..80 {
        let (status, body) = send(&app, post_json("/downloads", json!({ "url": TRACK_URL }))).await;
        if status == StatusCode::CONFLICT {
            rejected = Some(body);
            break;
        }
        assert_eq!(status, StatusCode::ACCEPTED);
    }

    let body = rejected.expect("queue should fill up");
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (_, body) = send(&app, get("/downloads?limit=500")).await;
    let records: Vec<DownloadRecord> = serde_json::from_value(body).unwrap();
    let failed: Vec<&DownloadRecord> = records
        .iter()
        .filter(|r| r.status == DownloadStatus::Failed)
        .collect();

    assert_eq!(failed.len(), 1);
    assert!(failed[0].ended_at.is_some());
    assert!(records.iter().filter(|r| r.status == DownloadStatus::Pending).count() <= 64);
}
