//! Library-side records and the structured answers the model returns

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A library item as the host hands it to the plugin
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    pub path: PathBuf,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub album_artist: String,
    pub genre: String,
    pub date: String,
    pub comment: String,
}

impl Item {
    /// Tag dictionary sent to the model, keyed like the raw file tags.
    ///
    /// Blank fields are left out. The file name goes under `FILE`.
    pub fn prompt_fields(&self) -> BTreeMap<String, Vec<String>> {
        let mut fields = BTreeMap::new();

        if let Some(name) = self.path.file_name() {
            fields.insert("FILE".to_string(), vec![name.to_string_lossy().into_owned()]);
        }

        for (key, value) in [
            ("TITLE", &self.title),
            ("ARTIST", &self.artist),
            ("ALBUM", &self.album),
            ("ALBUMARTIST", &self.album_artist),
            ("GENRE", &self.genre),
            ("DATE", &self.date),
            ("COMMENT", &self.comment),
        ] {
            if !value.trim().is_empty() {
                fields.insert(key.to_string(), vec![value.clone()]);
            }
        }

        fields
    }
}

/// Track-level match candidate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub album_artist: Option<String>,
    pub genres: Option<String>,
    pub date: Option<String>,
    pub comment: Option<String>,
}

/// Album-level match candidate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumInfo {
    pub tracks: Vec<TrackInfo>,
    pub album: String,
    pub artist: String,
    pub genre: Option<String>,
    pub year: Option<i32>,
    pub label: Option<String>,
    /// Various-artists release
    pub va: bool,
}

/// Track metadata as the model answers it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrackInfoAiResponse {
    pub title: String,
    pub artist: String,
    pub album: String,
    #[serde(default)]
    pub album_artist: Option<String>,
    #[serde(default, alias = "genre")]
    pub genres: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl From<TrackInfoAiResponse> for TrackInfo {
    fn from(response: TrackInfoAiResponse) -> Self {
        Self {
            title: response.title,
            artist: response.artist,
            album: response.album,
            album_artist: response.album_artist,
            genres: response.genres,
            date: response.date,
            comment: response.comment,
        }
    }
}

/// Album metadata as the model answers it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AlbumInfoAiResponse {
    pub tracks: Vec<TrackInfoAiResponse>,
    pub album_title: String,
    pub album_artist: String,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub is_compilation: Option<bool>,
}

impl From<AlbumInfoAiResponse> for AlbumInfo {
    fn from(response: AlbumInfoAiResponse) -> Self {
        Self {
            tracks: response.tracks.into_iter().map(TrackInfo::from).collect(),
            album: response.album_title,
            artist: response.album_artist,
            genre: response.genre,
            year: response.year,
            label: response.label,
            va: response.is_compilation.unwrap_or(false),
        }
    }
}
