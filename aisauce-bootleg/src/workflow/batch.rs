//! Batch orchestration
//!
//! Runs every URL of a download in order, keeps the download record and its
//! tracks up to date, persists after each step and posts the completion
//! callback at the end.

use crate::db::DownloadStore;
use crate::models::{DownloadRecord, DownloadStatus};
use crate::services::callback;
use crate::services::source;
use crate::workflow::pipeline::{Pipeline, TrackOutcome};
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Runs downloads through the per-track pipeline
pub struct BatchRunner {
    pipeline: Arc<Pipeline>,
    store: Arc<dyn DownloadStore>,
}

impl BatchRunner {
    pub fn new(pipeline: Arc<Pipeline>, store: Arc<dyn DownloadStore>) -> Self {
        Self { pipeline, store }
    }

    /// Process every URL of `record` and return the final status
    pub async fn run(&self, record: &mut DownloadRecord) -> DownloadStatus {
        info!(download_id = %record.id, "Starting bootleg download");

        record.start();
        let batch = record.is_batch();
        if batch {
            let source_name = record
                .urls
                .first()
                .and_then(|url| source::source_for_url(url).ok())
                .map(|s| s.name())
                .unwrap_or("unknown");
            record.title = format!("{} batch download", source_name);
        }

        let extra_path = if batch {
            batch_extra_path(&record.title, &Local::now().format("%Y-%m-%d").to_string())
        } else {
            String::new()
        };

        info!(download_id = %record.id, tracks = record.total_tracks, "Found {} tracks passed as urls", record.total_tracks);
        self.persist(record).await;

        for url in record.urls.clone() {
            let index = record.begin_track(&url);
            self.persist(record).await;

            match self.pipeline.process_track(&url, &extra_path).await {
                TrackOutcome::Completed(placed) => {
                    let mu = placed.meta.copy_with_unknown();
                    if !batch {
                        record.title = format!("{} {} - {}", placed.source.short_tag(), mu.artist, mu.title);
                    }
                    record.complete_track(index, mu.title, placed.path, placed.size);
                }
                TrackOutcome::Failed(failure) => {
                    error!(download_id = %record.id, url = %url, "{}", failure);
                    record.fail_track(index, failure.to_string());
                }
            }

            self.persist(record).await;
        }

        let status = record.finish();
        match status {
            DownloadStatus::Failed => error!(
                download_id = %record.id,
                "Download failed for {} tracks",
                record.failed_count()
            ),
            _ => info!(download_id = %record.id, "Download completed"),
        }

        self.persist(record).await;
        self.send_callback(record).await;
        status
    }

    /// Like [`run`](Self::run), but gives up after `timeout` and marks the
    /// download failed
    pub async fn run_with_timeout(&self, record: &mut DownloadRecord, timeout: Duration) -> DownloadStatus {
        let result = tokio::time::timeout(timeout, self.run(record)).await;
        match result {
            Ok(status) => status,
            Err(_) => {
                error!(download_id = %record.id, timeout = ?timeout, "Download timed out");
                record.abort(&format!("timed out after {:?}", timeout));
                self.persist(record).await;
                self.send_callback(record).await;
                record.status
            }
        }
    }

    async fn persist(&self, record: &DownloadRecord) {
        if let Err(e) = self.store.save(record).await {
            warn!(download_id = %record.id, error = %e, "Failed to persist download");
        }
    }

    async fn send_callback(&self, record: &DownloadRecord) {
        let Some(url) = record.callback_url.as_deref() else {
            return;
        };

        if let Err(e) = callback::notify(self.pipeline.http_client(), url, record).await {
            warn!(download_id = %record.id, error = %e, "Completion callback failed");
        }
    }
}

/// Directory name for a batch: title with spaces replaced, plus the date
pub fn batch_extra_path(title: &str, date: &str) -> String {
    format!("{}_{}", title.replace(' ', "_"), date)
}
