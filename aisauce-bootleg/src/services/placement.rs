//! File placement
//!
//! Destination layout, relative to the base download path:
//!
//! - album directory enabled and no extra path: `<artist> - <album>/<title><ext>`
//! - otherwise: `<extra_path>/<artist> - <title><ext>`
//!
//! Names come from the unknown-filled record, so empty fields never produce
//! empty path components.

use crate::models::MinimalMetaData;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Placement errors
#[derive(Debug, Error)]
pub enum PlacementError {
    /// Destination exists and the collision policy is `fail`
    #[error("Destination already exists: {0}")]
    Exists(PathBuf),

    #[error("Failed to create directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to move {0} to {1}: {2}")]
    Move(PathBuf, PathBuf, std::io::Error),
}

/// What to do when the destination file already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    Overwrite,
    Fail,
    /// Append ` (2)`, ` (3)`, ... to the file stem
    #[default]
    Rename,
}

impl CollisionPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Some(CollisionPolicy::Overwrite),
            "fail" => Some(CollisionPolicy::Fail),
            "rename" => Some(CollisionPolicy::Rename),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CollisionPolicy::Overwrite => "overwrite",
            CollisionPolicy::Fail => "fail",
            CollisionPolicy::Rename => "rename",
        }
    }
}

/// Where finished tracks go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementPolicy {
    pub base: PathBuf,
    pub create_album_dir: bool,
    pub on_collision: CollisionPolicy,
}

impl PlacementPolicy {
    pub fn new(base: impl Into<PathBuf>, create_album_dir: bool) -> Self {
        Self {
            base: base.into(),
            create_album_dir,
            on_collision: CollisionPolicy::default(),
        }
    }

    /// Destination for a file with extension `ext` (without the dot)
    pub fn destination(&self, meta: &MinimalMetaData, ext: &str, extra_path: &str) -> PathBuf {
        let mu = meta.copy_with_unknown();
        let suffix = if ext.is_empty() {
            String::new()
        } else {
            format!(".{}", ext)
        };

        if self.create_album_dir && extra_path.is_empty() {
            self.base
                .join(sanitize_component(&format!("{} - {}", mu.artist, mu.album)))
                .join(sanitize_component(&format!("{}{}", mu.title, suffix)))
        } else {
            let mut dir = self.base.clone();
            if !extra_path.is_empty() {
                dir.push(sanitize_component(extra_path));
            }
            dir.join(sanitize_component(&format!("{} - {}{}", mu.artist, mu.title, suffix)))
        }
    }

    /// Move `source` to its destination, creating parent directories.
    ///
    /// Rename is tried first; when it fails (e.g. across filesystems) the
    /// file is copied and the original removed.
    pub async fn place(
        &self,
        source: &Path,
        meta: &MinimalMetaData,
        extra_path: &str,
    ) -> Result<PathBuf, PlacementError> {
        let ext = source
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let target = self.destination(meta, ext, extra_path);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PlacementError::CreateDir(parent.to_path_buf(), e))?;
        }

        let target = self.resolve_collision(target).await?;

        tracing::info!(
            from = %source.display(),
            to = %target.display(),
            "Moving file"
        );

        match fs::rename(source, &target).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
                tracing::debug!(error = %e, "Rename crosses filesystems, copying instead");
                copy_then_remove(source, &target).await?;
            }
            Err(e) => return Err(PlacementError::Move(source.to_path_buf(), target, e)),
        }

        Ok(target)
    }

    async fn resolve_collision(&self, target: PathBuf) -> Result<PathBuf, PlacementError> {
        if !fs::try_exists(&target).await.unwrap_or(false) {
            return Ok(target);
        }

        match self.on_collision {
            CollisionPolicy::Overwrite => {
                tracing::warn!(path = %target.display(), "Overwriting existing file");
                Ok(target)
            }
            CollisionPolicy::Fail => Err(PlacementError::Exists(target)),
            CollisionPolicy::Rename => {
                let stem = target
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let ext = target.extension().map(|e| e.to_string_lossy().into_owned());

                let mut n = 2;
                loop {
                    let name = match &ext {
                        Some(ext) => format!("{} ({}).{}", stem, n, ext),
                        None => format!("{} ({})", stem, n),
                    };
                    let candidate = target.with_file_name(name);
                    if !fs::try_exists(&candidate).await.unwrap_or(false) {
                        return Ok(candidate);
                    }
                    n += 1;
                }
            }
        }
    }
}

/// Copy `source` to `target` and delete `source`. A failed copy leaves no
/// partial file at `target`.
pub async fn copy_then_remove(source: &Path, target: &Path) -> Result<(), PlacementError> {
    let move_error = |e: std::io::Error| PlacementError::Move(source.to_path_buf(), target.to_path_buf(), e);

    if let Err(e) = fs::copy(source, target).await {
        if let Err(cleanup) = fs::remove_file(target).await {
            tracing::debug!(path = %target.display(), error = %cleanup, "No partial copy to remove");
        }
        return Err(move_error(e));
    }

    fs::remove_file(source).await.map_err(move_error)
}

/// Make a string safe to use as a single path component
pub fn sanitize_component(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            other => other,
        })
        .collect()
}
