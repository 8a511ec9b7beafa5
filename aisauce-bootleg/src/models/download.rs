//! Download and track records
//!
//! A download progresses `PENDING → IN_PROGRESS → COMPLETED | FAILED`.
//! Each of its tracks independently goes `PENDING → COMPLETED | FAILED`;
//! the download ends FAILED if any track failed, even though the successful
//! tracks keep their results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Status shared by downloads and tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl DownloadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadStatus::Pending => "pending",
            DownloadStatus::InProgress => "in_progress",
            DownloadStatus::Completed => "completed",
            DownloadStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(DownloadStatus::Pending),
            "in_progress" => Some(DownloadStatus::InProgress),
            "completed" => Some(DownloadStatus::Completed),
            "failed" => Some(DownloadStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DownloadStatus::Completed | DownloadStatus::Failed)
    }
}

impl std::fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One URL of a download
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub id: Uuid,
    pub download_id: Uuid,
    pub url: String,
    pub title: Option<String>,
    pub path: Option<PathBuf>,
    /// Human-readable file size, e.g. "8.4 MB"
    pub size: Option<String>,
    pub status: DownloadStatus,
    /// Failure reason, set only when `status` is FAILED
    pub error: Option<String>,
}

impl TrackRecord {
    pub fn new(download_id: Uuid, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            download_id,
            url: url.into(),
            title: None,
            path: None,
            size: None,
            status: DownloadStatus::Pending,
            error: None,
        }
    }
}

/// A user request covering one or more URLs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadRecord {
    pub id: Uuid,
    pub urls: Vec<String>,
    pub title: String,
    pub status: DownloadStatus,
    pub total_tracks: usize,
    pub finished_tracks: usize,
    pub callback_url: Option<String>,
    pub tracks: Vec<TrackRecord>,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl DownloadRecord {
    /// Create a pending download from whitespace-separated URLs
    pub fn new(url_input: &str, callback_url: Option<String>) -> Self {
        let urls: Vec<String> = url_input.split_whitespace().map(str::to_string).collect();
        let title = urls.first().cloned().unwrap_or_default();

        Self {
            id: Uuid::new_v4(),
            total_tracks: urls.len(),
            urls,
            title,
            status: DownloadStatus::Pending,
            finished_tracks: 0,
            callback_url: callback_url.filter(|url| !url.trim().is_empty()),
            tracks: Vec::new(),
            created_at: Utc::now(),
            ended_at: None,
        }
    }

    pub fn is_batch(&self) -> bool {
        self.urls.len() > 1
    }

    /// PENDING → IN_PROGRESS; resets counters for a fresh run
    pub fn start(&mut self) {
        self.status = DownloadStatus::InProgress;
        self.total_tracks = self.urls.len();
        self.finished_tracks = 0;
        self.tracks.clear();
        self.ended_at = None;
    }

    /// Create the pending record for the next track and return its index
    pub fn begin_track(&mut self, url: &str) -> usize {
        self.tracks.push(TrackRecord::new(self.id, url));
        self.tracks.len() - 1
    }

    pub fn complete_track(&mut self, index: usize, title: String, path: PathBuf, size: String) {
        if let Some(track) = self.tracks.get_mut(index) {
            track.title = Some(title);
            track.path = Some(path);
            track.size = Some(size);
            track.status = DownloadStatus::Completed;
            self.finished_tracks += 1;
        }
    }

    pub fn fail_track(&mut self, index: usize, reason: String) {
        if let Some(track) = self.tracks.get_mut(index) {
            track.status = DownloadStatus::Failed;
            track.error = Some(reason);
        }
    }

    pub fn failed_count(&self) -> usize {
        self.tracks
            .iter()
            .filter(|t| t.status == DownloadStatus::Failed)
            .count()
    }

    /// Roll track states up into the final download state
    pub fn finish(&mut self) -> DownloadStatus {
        self.status = if self.failed_count() > 0 {
            DownloadStatus::Failed
        } else {
            DownloadStatus::Completed
        };
        self.ended_at = Some(Utc::now());
        self.status
    }

    /// Terminal failure outside the per-track loop (timeout, crash)
    pub fn abort(&mut self, reason: &str) {
        for track in self.tracks.iter_mut().filter(|t| !t.status.is_terminal()) {
            track.status = DownloadStatus::Failed;
            track.error = Some(reason.to_string());
        }
        self.status = DownloadStatus::Failed;
        self.ended_at = Some(Utc::now());
    }

    /// Paths of tracks that were placed successfully, in input order
    pub fn track_paths(&self) -> Vec<PathBuf> {
        self.tracks.iter().filter_map(|t| t.path.clone()).collect()
    }
}
