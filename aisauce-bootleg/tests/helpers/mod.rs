//! Shared fixtures for integration tests
#![allow(dead_code)]

pub mod audio_generator;

use aisauce_bootleg::models::MinimalMetaData;
use aisauce_bootleg::services::cleanup::{CleanupError, MetadataCleaner};
use aisauce_bootleg::services::downloader::{DownloadError, DownloadedFile, Downloader};
use aisauce_bootleg::services::placement::PlacementPolicy;
use aisauce_bootleg::services::source::Source;
use aisauce_bootleg::services::tags::TagMap;
use aisauce_bootleg::workflow::{Pipeline, PipelineConfig};
use aisauce_common::llm::LlmError;
use async_trait::async_trait;
use axum::{extract::State, routing::post, Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Downloader that writes tagged WAV files instead of calling extractors.
///
/// URLs without an entry fail like a crashed extractor.
#[derive(Default)]
pub struct FakeDownloader {
    tracks: HashMap<String, Vec<(String, String)>>,
    delay: Option<Duration>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_track(mut self, url: &str, tags: &[(&str, &str)]) -> Self {
        self.tracks.insert(
            url.to_string(),
            tags.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        );
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Downloader for FakeDownloader {
    async fn download(
        &self,
        url: &str,
        source: Source,
        dest_dir: &Path,
    ) -> Result<DownloadedFile, DownloadError> {
        self.calls.lock().unwrap().push(url.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let Some(tags) = self.tracks.get(url) else {
            return Err(DownloadError::ToolFailed {
                tool: "fake".to_string(),
                status: "exit status: 1".to_string(),
                stderr: format!("ERROR: unable to download {}", url),
            });
        };

        let path = dest_dir.join("download.wav");
        let tags: Vec<(&str, &str)> = tags.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        audio_generator::write_tagged_wav(&path, &tags);

        Ok(DownloadedFile { path, source })
    }
}

/// Cleaner that always fails, forcing the raw-tag fallback
pub struct FailingCleaner;

#[async_trait]
impl MetadataCleaner for FailingCleaner {
    async fn cleanup(&self, _tags: &TagMap, _file_name: &str) -> Result<MinimalMetaData, CleanupError> {
        Err(CleanupError::Llm(LlmError::ApiError(503, "unavailable".to_string())))
    }
}

/// Pipeline writing into `base`, with temporary downloads under `temp`
pub fn test_pipeline(
    base: &Path,
    temp: &Path,
    downloader: Arc<dyn Downloader>,
    cleaner: Arc<dyn MetadataCleaner>,
) -> Pipeline {
    let config = PipelineConfig {
        temp_root: temp.to_path_buf(),
        ..PipelineConfig::new(PlacementPolicy::new(base, true))
    };
    Pipeline::new(config, downloader, cleaner, reqwest::Client::new())
}

/// Serve `app` on an ephemeral local port and return its base URL
pub async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Callback receiver collecting every JSON body POSTed to `/done`
pub async fn spawn_callback_receiver() -> (String, Arc<Mutex<Vec<Value>>>) {
    async fn done(State(received): State<Arc<Mutex<Vec<Value>>>>, Json(body): Json<Value>) -> Json<Value> {
        received.lock().unwrap().push(body);
        Json(json!({ "ok": true }))
    }

    let received = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/done", post(done))
        .with_state(received.clone());
    let base = spawn_server(app).await;
    (format!("{}/done", base), received)
}

/// Chat completion endpoint answering every request with `content`
pub async fn spawn_llm(content: Value) -> String {
    async fn completions(State(content): State<Arc<String>>) -> Json<Value> {
        Json(json!({
            "choices": [
                { "message": { "role": "assistant", "content": content.as_str() } }
            ]
        }))
    }

    let app = Router::new()
        .route("/chat/completions", post(completions))
        .with_state(Arc::new(content.to_string()));
    spawn_server(app).await
}
