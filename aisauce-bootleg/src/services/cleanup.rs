//! Metadata cleanup
//!
//! Raw tags plus the file name go to a chat model, which answers with the six
//! fields of [`MinimalMetaData`] as JSON. Callers fall back to
//! [`fallback_metadata`] whenever cleanup fails.

use crate::models::MinimalMetaData;
use crate::services::prompts::TAG_PLACEHOLDER;
use crate::services::tags::TagMap;
use aisauce_common::llm::{ChatClient, LlmError};
use aisauce_common::SourceConfig;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

/// Marker words that uploaders put into titles of free releases
static FREE_DOWNLOAD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*[\(\[]?(free download|free dl|\[free\]|\(free\))[\)\]]?\s*")
        .expect("free download pattern is valid")
});

/// Cleanup errors
#[derive(Debug, Error)]
pub enum CleanupError {
    /// No provider configured
    #[error("Metadata cleanup disabled: no API key configured")]
    Disabled,

    #[error("Metadata cleanup request failed: {0}")]
    Llm(#[from] LlmError),

    /// Tag map could not be rendered into the prompt
    #[error("Failed to render prompt: {0}")]
    Prompt(String),
}

/// Turns raw tags into a cleaned record
#[async_trait]
pub trait MetadataCleaner: Send + Sync {
    async fn cleanup(&self, tags: &TagMap, file_name: &str) -> Result<MinimalMetaData, CleanupError>;
}

/// Fields as returned by the model; anything missing is empty
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CleanedFields {
    title: String,
    artist: String,
    album: String,
    album_artist: String,
    #[serde(alias = "genres")]
    genre: String,
    date: String,
}

impl From<CleanedFields> for MinimalMetaData {
    fn from(fields: CleanedFields) -> Self {
        MinimalMetaData::new(
            fields.title,
            fields.artist,
            fields.album,
            fields.album_artist,
            fields.genre,
            fields.date,
        )
    }
}

/// Cleaner backed by an OpenAI-compatible chat model
pub struct LlmCleaner {
    client: ChatClient,
    system_prompt: String,
    user_prompt: String,
}

impl LlmCleaner {
    pub fn new(source: SourceConfig) -> Result<Self, LlmError> {
        Ok(Self {
            client: ChatClient::new(source.provider)?,
            system_prompt: source.system_prompt,
            user_prompt: source.user_prompt,
        })
    }
}

#[async_trait]
impl MetadataCleaner for LlmCleaner {
    async fn cleanup(&self, tags: &TagMap, file_name: &str) -> Result<MinimalMetaData, CleanupError> {
        let prompt = render_user_prompt(&self.user_prompt, tags, file_name)?;
        let fields: CleanedFields = self
            .client
            .structured(Some(&self.system_prompt), &prompt)
            .await?;

        let meta = MinimalMetaData::from(fields);
        tracing::info!(meta = %meta, "AI cleaned metadata");
        Ok(meta)
    }
}

/// Stand-in used when no provider is configured
pub struct DisabledCleaner;

#[async_trait]
impl MetadataCleaner for DisabledCleaner {
    async fn cleanup(&self, _tags: &TagMap, _file_name: &str) -> Result<MinimalMetaData, CleanupError> {
        Err(CleanupError::Disabled)
    }
}

/// Fill the prompt template with the key-sorted JSON dump of `tags` plus a
/// `FILE` entry holding the file name
pub fn render_user_prompt(template: &str, tags: &TagMap, file_name: &str) -> Result<String, CleanupError> {
    let mut input = tags.clone();
    input.insert("FILE".to_string(), vec![file_name.to_string()]);

    let dump = serde_json::to_string_pretty(&input).map_err(|e| CleanupError::Prompt(e.to_string()))?;
    Ok(template.replacen(TAG_PLACEHOLDER, &dump, 1))
}

/// Metadata straight from the raw tags, multiple values joined by spaces
pub fn fallback_metadata(tags: &TagMap) -> MinimalMetaData {
    let joined = |key: &str| tags.get(key).map(|values| values.join(" ")).unwrap_or_default();
    MinimalMetaData::basic(joined("TITLE"), joined("ARTIST"), joined("ALBUM"))
}

/// Remove "free download" style markers from a title
pub fn strip_free_download(title: &str) -> String {
    FREE_DOWNLOAD_RE.replace_all(title, "").into_owned()
}

/// Split an `"Artist - Title"` title into its two parts.
///
/// Only titles with exactly one separator qualify.
pub fn infer_artist_from_title(title: &str) -> Option<(String, String)> {
    let parts: Vec<&str> = title.split(" - ").collect();
    match parts.as_slice() {
        [artist, title] => Some((artist.to_string(), title.to_string())),
        _ => None,
    }
}
