//! Per-track pipeline
//!
//! One URL goes through these stages:
//! - **Resolve**: expand share links
//! - **Detect**: pick the source from the URL
//! - **Download**: fetch into a fresh temporary directory
//! - **Tag**: read tags, infer artist, clean up, apply tweaks, write back
//! - **Place**: move into the library layout
//!
//! Failures are returned as [`TrackFailure`] values carrying the stage they
//! happened in; they never abort the surrounding batch.

use crate::models::MinimalMetaData;
use crate::services::cleanup::{self, CleanupError, MetadataCleaner};
use crate::services::downloader::Downloader;
use crate::services::placement::PlacementPolicy;
use crate::services::source::{self, Source};
use crate::services::tags::{TagEditor, TagMap};
use crate::services::tweaks::UserTweaks;
use bytesize::ByteSize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub placement: PlacementPolicy,
    pub tweaks: UserTweaks,
    /// Drop every existing tag before writing the cleaned ones
    pub clean_all_tags: bool,
    /// Split `"Artist - Title"` YouTube titles into artist and title
    pub youtube_infer_artist: bool,
    /// Parent of the per-track download directories
    pub temp_root: PathBuf,
}

impl PipelineConfig {
    pub fn new(placement: PlacementPolicy) -> Self {
        Self {
            placement,
            tweaks: UserTweaks::default(),
            clean_all_tags: false,
            youtube_infer_artist: true,
            temp_root: std::env::temp_dir(),
        }
    }
}

/// Stage a track failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackStage {
    Resolve,
    Detect,
    Download,
    Tag,
    Place,
}

impl TrackStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackStage::Resolve => "resolve",
            TrackStage::Detect => "detect",
            TrackStage::Download => "download",
            TrackStage::Tag => "tag",
            TrackStage::Place => "place",
        }
    }
}

/// Why a track failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackFailure {
    pub stage: TrackStage,
    pub reason: String,
}

impl TrackFailure {
    fn new(stage: TrackStage, reason: impl ToString) -> Self {
        Self {
            stage,
            reason: reason.to_string(),
        }
    }

    /// ARTIST or TITLE missing after download
    pub fn is_missing_tags(&self) -> bool {
        self.stage == TrackStage::Tag && self.reason.starts_with(MISSING_TAGS)
    }
}

impl fmt::Display for TrackFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage.as_str(), self.reason)
    }
}

const MISSING_TAGS: &str = "Missing ARTIST or TITLE tag";

/// A track that made it into the library
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedTrack {
    pub path: PathBuf,
    /// Metadata as written to the file tags
    pub meta: MinimalMetaData,
    pub source: Source,
    /// Human-readable size, e.g. "8.4 MB"
    pub size: String,
}

/// Result of one track
#[derive(Debug, Clone, PartialEq)]
pub enum TrackOutcome {
    Completed(PlacedTrack),
    Failed(TrackFailure),
}

/// Per-track pipeline
pub struct Pipeline {
    config: PipelineConfig,
    downloader: Arc<dyn Downloader>,
    cleaner: Arc<dyn MetadataCleaner>,
    http_client: reqwest::Client,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        downloader: Arc<dyn Downloader>,
        cleaner: Arc<dyn MetadataCleaner>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            config,
            downloader,
            cleaner,
            http_client,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    /// Run one URL through every stage.
    ///
    /// `extra_path` adds a directory level below the base path (batches).
    pub async fn process_track(&self, url: &str, extra_path: &str) -> TrackOutcome {
        match self.run_track(url, extra_path).await {
            Ok(placed) => TrackOutcome::Completed(placed),
            Err(failure) => TrackOutcome::Failed(failure),
        }
    }

    async fn run_track(&self, url: &str, extra_path: &str) -> Result<PlacedTrack, TrackFailure> {
        let url = source::resolve_short_url(&self.http_client, url)
            .await
            .map_err(|e| TrackFailure::new(TrackStage::Resolve, e))?;

        let source = source::source_for_url(&url).map_err(|e| TrackFailure::new(TrackStage::Detect, e))?;

        // Removed when dropped, whatever the outcome
        let work_dir = self
            .create_work_dir()
            .map_err(|e| TrackFailure::new(TrackStage::Download, e))?;

        let downloaded = self
            .downloader
            .download(&url, source, work_dir.path())
            .await
            .map_err(|e| TrackFailure::new(TrackStage::Download, e))?;

        info!(path = %downloaded.path.display(), "Tagging audio file");
        let meta = self.retag(&downloaded.path, source).await?;

        let size = std::fs::metadata(&downloaded.path)
            .map(|m| ByteSize::b(m.len()).display().si().to_string())
            .map_err(|e| TrackFailure::new(TrackStage::Place, e))?;

        let path = self
            .config
            .placement
            .place(&downloaded.path, &meta, extra_path)
            .await
            .map_err(|e| TrackFailure::new(TrackStage::Place, e))?;

        Ok(PlacedTrack {
            path,
            meta,
            source,
            size,
        })
    }

    fn create_work_dir(&self) -> std::io::Result<tempfile::TempDir> {
        std::fs::create_dir_all(&self.config.temp_root)?;
        tempfile::Builder::new()
            .prefix("track-")
            .tempdir_in(&self.config.temp_root)
    }

    /// Read tags, derive cleaned metadata and write it back
    async fn retag(&self, path: &Path, source: Source) -> Result<MinimalMetaData, TrackFailure> {
        let tag_failure = |e: crate::services::tags::TagError| TrackFailure::new(TrackStage::Tag, e);

        let mut editor = TagEditor::open(path).map_err(tag_failure)?;
        let mut tags = editor.tags();

        if self.config.youtube_infer_artist && source == Source::YouTube {
            infer_youtube_artist(&mut tags);
        }

        debug!(tags = ?tags, "Tags");
        if !has_value(&tags, "ARTIST") || !has_value(&tags, "TITLE") {
            return Err(TrackFailure::new(TrackStage::Tag, MISSING_TAGS));
        }

        if let Some(titles) = tags.get_mut("TITLE") {
            let cleaned = cleanup::strip_free_download(&titles[0]);
            *titles = vec![cleaned];
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut meta = match self.cleaner.cleanup(&tags, &file_name).await {
            Ok(meta) => meta,
            Err(CleanupError::Disabled) => {
                debug!("Metadata cleanup disabled, using raw tags");
                cleanup::fallback_metadata(&tags)
            }
            Err(e) => {
                warn!(error = %e, "AI cleanup failed, using raw tags");
                cleanup::fallback_metadata(&tags)
            }
        };

        if self.config.clean_all_tags {
            editor.clear();
        }

        self.config.tweaks.apply(&mut meta);
        info!(meta = %meta, "Final metadata");

        for (key, value) in meta.to_tag_dict() {
            editor.set(key, &[value.to_string()]).map_err(tag_failure)?;
        }
        editor.save().map_err(tag_failure)?;

        Ok(meta)
    }
}

/// Replace ARTIST/TITLE when the first title has the form `"Artist - Title"`
fn infer_youtube_artist(tags: &mut TagMap) {
    let Some(title) = tags.get("TITLE").and_then(|t| t.first()) else {
        return;
    };

    if let Some((artist, title)) = cleanup::infer_artist_from_title(title) {
        debug!(artist = %artist, title = %title, "Inferred artist from title");
        tags.insert("ARTIST".to_string(), vec![artist]);
        tags.insert("TITLE".to_string(), vec![title]);
    }
}

fn has_value(tags: &TagMap, key: &str) -> bool {
    tags.get(key)
        .map(|values| values.iter().any(|v| !v.trim().is_empty()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, &str)]) -> TagMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), vec![v.to_string()]))
            .collect()
    }

    #[test]
    fn test_infer_youtube_artist_splits_title() {
        let mut tags = map(&[("TITLE", "Busta Rhymes - Gimme Some More"), ("ARTIST", "Uploader")]);
        infer_youtube_artist(&mut tags);
        assert_eq!(tags["ARTIST"], vec!["Busta Rhymes"]);
        assert_eq!(tags["TITLE"], vec!["Gimme Some More"]);
    }

    #[test]
    fn test_infer_youtube_artist_leaves_plain_titles() {
        let mut tags = map(&[("TITLE", "Gimme Some More"), ("ARTIST", "Uploader")]);
        infer_youtube_artist(&mut tags);
        assert_eq!(tags["ARTIST"], vec!["Uploader"]);
    }

    #[test]
    fn test_has_value_ignores_blank_entries() {
        let tags = map(&[("ARTIST", "  "), ("TITLE", "T")]);
        assert!(!has_value(&tags, "ARTIST"));
        assert!(has_value(&tags, "TITLE"));
        assert!(!has_value(&tags, "ALBUM"));
    }

    #[test]
    fn test_failure_display_names_stage() {
        let failure = TrackFailure::new(TrackStage::Download, "exit 1");
        assert_eq!(failure.to_string(), "download failed: exit 1");
        assert!(TrackFailure::new(TrackStage::Tag, MISSING_TAGS).is_missing_tags());
    }
}
