//! Tag reading and writing using lofty
//!
//! Tags are exposed as `KEY → [values]` with upper-case keys (TITLE, ARTIST,
//! ALBUMARTIST, ...), independent of the container format.

use lofty::config::WriteOptions;
use lofty::file::{AudioFile, TaggedFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::{ItemKey, ItemValue, Tag, TagItem};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Tag name → values, sorted by name
pub type TagMap = BTreeMap<String, Vec<String>>;

/// Tag errors
#[derive(Debug, Error)]
pub enum TagError {
    /// File could not be opened or parsed
    #[error("Failed to read tags from {0}: {1}")]
    ReadError(PathBuf, String),

    /// Tag could not be written back
    #[error("Failed to write tags to {0}: {1}")]
    WriteError(PathBuf, String),

    /// Key cannot be stored in this container's tag format
    #[error("Tag key {0} not supported by this file format")]
    UnsupportedKey(String),
}

/// Open audio file with editable tags
pub struct TagEditor {
    path: PathBuf,
    file: TaggedFile,
}

impl TagEditor {
    pub fn open(path: &Path) -> Result<Self, TagError> {
        let file = Probe::open(path)
            .map_err(|e| TagError::ReadError(path.to_path_buf(), e.to_string()))?
            .read()
            .map_err(|e| TagError::ReadError(path.to_path_buf(), e.to_string()))?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All text tags of the primary tag (or the first tag present)
    pub fn tags(&self) -> TagMap {
        let mut map = TagMap::new();
        let Some(tag) = self.file.primary_tag().or_else(|| self.file.first_tag()) else {
            return map;
        };

        for item in tag.items() {
            if let ItemValue::Text(text) = item.value() {
                map.entry(key_name(item.key()))
                    .or_default()
                    .push(text.clone());
            }
        }
        map
    }

    /// Values of one key; empty when absent
    pub fn get(&self, key: &str) -> Vec<String> {
        self.tags().remove(key).unwrap_or_default()
    }

    /// Replace all values of `key`. Empty strings are dropped, so an empty
    /// slice (or only empty strings) removes the key.
    pub fn set(&mut self, key: &str, values: &[String]) -> Result<(), TagError> {
        let item_key = item_key(key);
        let tag = self.primary_tag_mut();
        tag.remove_key(&item_key);

        for value in values.iter().filter(|v| !v.is_empty()) {
            let item = TagItem::new(item_key.clone(), ItemValue::Text(value.clone()));
            if !tag.push(item) {
                return Err(TagError::UnsupportedKey(key.to_string()));
            }
        }
        Ok(())
    }

    /// Remove every tag item; embedded pictures are kept
    pub fn clear(&mut self) {
        self.primary_tag_mut().retain(|_| false);
    }

    pub fn save(&self) -> Result<(), TagError> {
        self.file
            .save_to_path(&self.path, WriteOptions::default())
            .map_err(|e| TagError::WriteError(self.path.clone(), e.to_string()))?;

        tracing::debug!(path = %self.path.display(), "Tags saved");
        Ok(())
    }

    fn primary_tag_mut(&mut self) -> &mut Tag {
        if self.file.primary_tag().is_none() {
            let tag_type = self.file.primary_tag_type();
            self.file.insert_tag(Tag::new(tag_type));
        }
        self.file
            .primary_tag_mut()
            .expect("primary tag inserted above")
    }
}

/// Read the tag map of a file
pub fn read_tags(path: &Path) -> Result<TagMap, TagError> {
    Ok(TagEditor::open(path)?.tags())
}

fn item_key(name: &str) -> ItemKey {
    match name {
        "TITLE" => ItemKey::TrackTitle,
        "ARTIST" => ItemKey::TrackArtist,
        "ALBUM" => ItemKey::AlbumTitle,
        "ALBUMARTIST" => ItemKey::AlbumArtist,
        "GENRE" => ItemKey::Genre,
        "DATE" => ItemKey::RecordingDate,
        "COMMENT" => ItemKey::Comment,
        "COMPOSER" => ItemKey::Composer,
        other => ItemKey::Unknown(other.to_string()),
    }
}

fn key_name(key: &ItemKey) -> String {
    match key {
        ItemKey::TrackTitle => "TITLE".to_string(),
        ItemKey::TrackArtist => "ARTIST".to_string(),
        ItemKey::AlbumTitle => "ALBUM".to_string(),
        ItemKey::AlbumArtist => "ALBUMARTIST".to_string(),
        ItemKey::Genre => "GENRE".to_string(),
        ItemKey::RecordingDate | ItemKey::Year => "DATE".to_string(),
        ItemKey::Comment => "COMMENT".to_string(),
        ItemKey::Composer => "COMPOSER".to_string(),
        ItemKey::Unknown(raw) => raw.to_uppercase(),
        other => format!("{:?}", other).to_uppercase(),
    }
}
