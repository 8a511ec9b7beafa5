//! Bootleg downloader library
//!
//! Downloads tracks from SoundCloud and YouTube, cleans their metadata with
//! an LLM and files them into the music library. Exposed as a library for
//! the binary and for integration testing.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod workflow;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::BootlegConfig;
use crate::services::cleanup::{DisabledCleaner, LlmCleaner, MetadataCleaner};
use crate::services::downloader::{Downloader, ExternalDownloader};
use crate::workflow::{BatchRunner, DownloadQueue, Pipeline};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub queue: DownloadQueue,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, queue: DownloadQueue) -> Self {
        Self {
            db,
            queue,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::download_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Metadata cleaner for `config`; cleanup is disabled without an API key
pub fn build_cleaner(config: &BootlegConfig) -> Arc<dyn MetadataCleaner> {
    if !config.cleanup_enabled() {
        return Arc::new(DisabledCleaner);
    }

    match LlmCleaner::new(config.source.clone()) {
        Ok(cleaner) => Arc::new(cleaner),
        Err(e) => {
            tracing::warn!(error = %e, "Metadata cleanup unavailable");
            Arc::new(DisabledCleaner)
        }
    }
}

/// Wire the download pipeline from configuration
pub fn build_pipeline(config: &BootlegConfig) -> Pipeline {
    let downloader: Arc<dyn Downloader> = Arc::new(ExternalDownloader::new(
        config.ytdlp_path.clone(),
        config.scdl_path.clone(),
        config.soundcloud_auth_token.clone(),
    ));

    Pipeline::new(
        config.pipeline_config(),
        downloader,
        build_cleaner(config),
        reqwest::Client::new(),
    )
}

/// Batch runner persisting into `db`
pub fn build_runner(config: &BootlegConfig, db: SqlitePool) -> BatchRunner {
    BatchRunner::new(Arc::new(build_pipeline(config)), Arc::new(db))
}
