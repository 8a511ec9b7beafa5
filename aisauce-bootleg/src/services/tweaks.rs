//! User overrides applied after cleanup

use crate::models::MinimalMetaData;

/// Fixed-order adjustments to cleaned metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserTweaks {
    /// Appended as ` [<s>]` unless the title already contains it (any case)
    pub ensure_in_title: Option<String>,
    /// Copy the (possibly extended) title into the album
    pub title_as_album: bool,
    pub album_override: Option<String>,
    pub album_artist_override: Option<String>,
}

impl UserTweaks {
    /// Apply ensure-in-title, title-as-album, album override and
    /// album-artist override, in that order
    pub fn apply(&self, meta: &mut MinimalMetaData) {
        if let Some(ensured) = &self.ensure_in_title {
            if !meta.title.to_lowercase().contains(&ensured.to_lowercase()) {
                meta.title = format!("{} [{}]", meta.title, ensured);
            }
        }

        if self.title_as_album {
            meta.album = meta.title.clone();
        }

        if let Some(album) = &self.album_override {
            meta.album = album.clone();
        }

        if let Some(album_artist) = &self.album_artist_override {
            meta.album_artist = album_artist.clone();
        }

        tracing::debug!(meta = %meta, "Metadata after user tweaks");
    }
}
