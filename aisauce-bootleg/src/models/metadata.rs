//! Minimal per-track metadata record
//!
//! Constructed fresh for every downloaded track, adjusted by user tweaks,
//! written back to the file's tags and used to name the file on disk.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag keys written back to every file, in write order
pub const TAG_KEYS: [&str; 6] = ["TITLE", "ARTIST", "ALBUM", "ALBUMARTIST", "GENRE", "DATE"];

/// The six fields AISauce manages on a track.
///
/// Deserialization goes through [`MinimalMetaData::new`], so an empty
/// `album_artist` is filled from `artist` there too. Direct field edits
/// bypass that rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "MetaDataFields")]
pub struct MinimalMetaData {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub album_artist: String,
    pub genre: String,
    pub date: String,
}

/// Wire form of [`MinimalMetaData`]
#[derive(Default, Deserialize)]
#[serde(default)]
struct MetaDataFields {
    title: String,
    artist: String,
    album: String,
    album_artist: String,
    genre: String,
    date: String,
}

impl From<MetaDataFields> for MinimalMetaData {
    fn from(f: MetaDataFields) -> Self {
        Self::new(f.title, f.artist, f.album, f.album_artist, f.genre, f.date)
    }
}

impl MinimalMetaData {
    /// Build a record; an empty `album_artist` falls back to `artist`.
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
        album_artist: impl Into<String>,
        genre: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        let artist = artist.into();
        let mut album_artist = album_artist.into();
        if album_artist.is_empty() {
            album_artist = artist.clone();
        }

        Self {
            title: title.into(),
            artist,
            album: album.into(),
            album_artist,
            genre: genre.into(),
            date: date.into(),
        }
    }

    /// Record with only title, artist and album known
    pub fn basic(
        title: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
    ) -> Self {
        Self::new(title, artist, album, "", "", "")
    }

    /// Copy with every empty field replaced by an `Unknown <Field>` placeholder.
    ///
    /// For on-disk naming and display only; never written to tags.
    pub fn copy_with_unknown(&self) -> Self {
        fn or_unknown(value: &str, placeholder: &str) -> String {
            if value.is_empty() {
                placeholder.to_string()
            } else {
                value.to_string()
            }
        }

        Self {
            title: or_unknown(&self.title, "Unknown Title"),
            artist: or_unknown(&self.artist, "Unknown Artist"),
            album: or_unknown(&self.album, "Unknown Album"),
            album_artist: or_unknown(&self.album_artist, "Unknown Album Artist"),
            genre: or_unknown(&self.genre, "Unknown Genre"),
            date: or_unknown(&self.date, "Unknown Date"),
        }
    }

    /// Project onto container tag keys, in `TAG_KEYS` order
    pub fn to_tag_dict(&self) -> [(&'static str, &str); 6] {
        [
            (TAG_KEYS[0], self.title.as_str()),
            (TAG_KEYS[1], self.artist.as_str()),
            (TAG_KEYS[2], self.album.as_str()),
            (TAG_KEYS[3], self.album_artist.as_str()),
            (TAG_KEYS[4], self.genre.as_str()),
            (TAG_KEYS[5], self.date.as_str()),
        ]
    }
}

impl fmt::Display for MinimalMetaData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "title={:?} artist={:?} album={:?} album_artist={:?} genre={:?} date={:?}",
            self.title, self.artist, self.album, self.album_artist, self.genre, self.date
        )
    }
}
