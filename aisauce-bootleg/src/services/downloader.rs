//! Download adapter for streaming sites
//!
//! Site extraction is delegated to the `yt-dlp` and `scdl` command-line
//! tools. Each call downloads into its own empty directory and reports the
//! single audio file it finds there, so nothing depends on the tools'
//! internal naming.

use crate::services::source::Source;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

/// File extensions treated as downloaded audio
pub const AUDIO_EXTENSIONS: [&str; 9] = [
    "mp3", "flac", "m4a", "opus", "ogg", "wav", "aac", "webm", "aiff",
];

/// Square-crop the thumbnail before it is embedded as cover art
const THUMBNAIL_CROP_PPA: &str =
    "ThumbnailsConvertor+ffmpeg_o:-c:v mjpeg -vf crop=\"'if(gt(ih,iw),iw,ih)':'if(gt(iw,ih),ih,iw)'\"";

/// Download errors
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Extractor binary not found in PATH
    #[error("{0} binary not found in PATH")]
    BinaryNotFound(String),

    /// Failed to spawn the extractor
    #[error("Failed to execute {0}: {1}")]
    ExecutionError(String, String),

    /// Extractor exited unsuccessfully
    #[error("{tool} failed ({status}): {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    /// Extractor succeeded but left no audio file behind
    #[error("No audio file produced in {0}")]
    NoOutput(PathBuf),

    /// URL expanded to more than one file (playlist or set)
    #[error("Item is not a track: {0} audio files produced")]
    NotATrack(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of a successful download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub path: PathBuf,
    pub source: Source,
}

/// Narrow interface over site-specific extraction
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Download `url` into `dest_dir`, which must exist and be empty
    async fn download(
        &self,
        url: &str,
        source: Source,
        dest_dir: &Path,
    ) -> Result<DownloadedFile, DownloadError>;
}

/// Downloader backed by external command-line extractors
#[derive(Debug, Clone)]
pub struct ExternalDownloader {
    ytdlp_path: String,
    scdl_path: String,
    soundcloud_auth_token: Option<String>,
}

impl ExternalDownloader {
    pub fn new(
        ytdlp_path: impl Into<String>,
        scdl_path: impl Into<String>,
        soundcloud_auth_token: Option<String>,
    ) -> Self {
        Self {
            ytdlp_path: ytdlp_path.into(),
            scdl_path: scdl_path.into(),
            soundcloud_auth_token,
        }
    }

    /// Best audio stream, converted to mp3 with metadata and square cover art
    pub fn youtube_args(url: &str, dest_dir: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "--format",
            "bestaudio",
            "--extract-audio",
            "--audio-format",
            "mp3",
            "--embed-metadata",
            "--embed-thumbnail",
            "--convert-thumbnails",
            "jpg",
            "--ppa",
            THUMBNAIL_CROP_PPA,
            "--no-playlist",
            "--no-progress",
            "--output",
            "%(title)s.%(ext)s",
            "--paths",
        ]
        .iter()
        .map(OsString::from)
        .collect();
        args.push(dest_dir.as_os_str().to_owned());
        args.push(OsString::from(url));
        args
    }

    /// Original file when available (flac otherwise), artist taken from title
    pub fn soundcloud_args(&self, url: &str, dest_dir: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            OsString::from("-l"),
            OsString::from(url),
            OsString::from("--path"),
            dest_dir.as_os_str().to_owned(),
            OsString::from("--flac"),
            OsString::from("--extract-artist"),
            OsString::from("--overwrite"),
            OsString::from("--hide-progress"),
        ];
        if let Some(token) = &self.soundcloud_auth_token {
            args.push(OsString::from("--auth-token"));
            args.push(OsString::from(token));
        }
        args
    }

    async fn run(&self, tool: &str, args: Vec<OsString>) -> Result<(), DownloadError> {
        tracing::debug!(tool = %tool, "Running extractor");

        let output = Command::new(tool)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => DownloadError::BinaryNotFound(tool.to_string()),
                _ => DownloadError::ExecutionError(tool.to_string(), e.to_string()),
            })?;

        if !output.status.success() {
            return Err(DownloadError::ToolFailed {
                tool: tool.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl Downloader for ExternalDownloader {
    async fn download(
        &self,
        url: &str,
        source: Source,
        dest_dir: &Path,
    ) -> Result<DownloadedFile, DownloadError> {
        tracing::info!(url = %url, source = %source, "Detected {} url", source);

        match source {
            Source::YouTube => {
                self.run(&self.ytdlp_path, Self::youtube_args(url, dest_dir))
                    .await?
            }
            Source::SoundCloud => {
                self.run(&self.scdl_path, self.soundcloud_args(url, dest_dir))
                    .await?
            }
        }

        let path = find_audio_file(dest_dir)?;
        tracing::info!(path = %path.display(), "Downloaded file");

        Ok(DownloadedFile { path, source })
    }
}

/// Locate the one audio file in `dir`
pub fn find_audio_file(dir: &Path) -> Result<PathBuf, DownloadError> {
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_audio_file(&path) {
            found.push(path);
        }
    }

    match found.len() {
        0 => Err(DownloadError::NoOutput(dir.to_path_buf())),
        1 => Ok(found.remove(0)),
        n => Err(DownloadError::NotATrack(n)),
    }
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_youtube_args_target_dest_dir() {
        let args = as_strings(&ExternalDownloader::youtube_args(
            "https://youtu.be/abc",
            Path::new("/tmp/dl"),
        ));
        assert_eq!(args.last().unwrap(), "https://youtu.be/abc");
        let paths_idx = args.iter().position(|a| a == "--paths").unwrap();
        assert_eq!(args[paths_idx + 1], "/tmp/dl");
        assert!(args.contains(&"--extract-audio".to_string()));
        assert!(args.contains(&"--no-playlist".to_string()));
    }

    #[test]
    fn test_soundcloud_args_include_token_when_set() {
        let downloader = ExternalDownloader::new("yt-dlp", "scdl", Some("tok".to_string()));
        let args = as_strings(&downloader.soundcloud_args("https://soundcloud.com/a/b", Path::new("/tmp/dl")));
        assert_eq!(&args[..4], ["-l", "https://soundcloud.com/a/b", "--path", "/tmp/dl"]);
        let token_idx = args.iter().position(|a| a == "--auth-token").unwrap();
        assert_eq!(args[token_idx + 1], "tok");

        let anonymous = ExternalDownloader::new("yt-dlp", "scdl", None);
        let args = as_strings(&anonymous.soundcloud_args("https://soundcloud.com/a/b", Path::new("/tmp/dl")));
        assert!(!args.contains(&"--auth-token".to_string()));
    }

    #[test]
    fn test_find_audio_file_ignores_thumbnails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cover.jpg"), b"jpg").unwrap();
        std::fs::write(dir.path().join("Track.MP3"), b"mp3").unwrap();

        let found = find_audio_file(dir.path()).unwrap();
        assert_eq!(found.file_name().unwrap(), "Track.MP3");
    }

    #[test]
    fn test_find_audio_file_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(find_audio_file(dir.path()), Err(DownloadError::NoOutput(_))));
    }

    #[test]
    fn test_find_audio_file_rejects_sets() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.flac"), b"1").unwrap();
        std::fs::write(dir.path().join("b.flac"), b"2").unwrap();
        assert!(matches!(find_audio_file(dir.path()), Err(DownloadError::NotATrack(2))));
    }

    #[tokio::test]
    async fn test_missing_binary_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = ExternalDownloader::new("aisauce-no-such-ytdlp-binary", "scdl", None);
        let result = downloader
            .download("https://youtu.be/abc", Source::YouTube, dir.path())
            .await;
        assert!(matches!(result, Err(DownloadError::BinaryNotFound(tool)) if tool == "aisauce-no-such-ytdlp-binary"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_abandoned_download_kills_extractor() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("finished");
        let script = dir.path().join("slow-ytdlp");
        std::fs::write(
            &script,
            format!("#!/bin/sh\nsleep 1\ntouch '{}'\n", marker.display()),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let dest = dir.path().join("dest");
        std::fs::create_dir(&dest).unwrap();
        let downloader = ExternalDownloader::new(script.to_string_lossy(), "scdl", None);

        let result = tokio::time::timeout(
            std::time::Duration::from_millis(200),
            downloader.download("https://youtu.be/abc", Source::YouTube, &dest),
        )
        .await;
        assert!(result.is_err());

        tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
        assert!(!marker.exists());
    }
}
