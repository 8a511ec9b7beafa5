//! Metadata-source plugin surface
//!
//! The host asks a metadata source for lookups by id and for candidate
//! matches. AISauce is a tagging assistant rather than a search provider, so
//! every host-driven operation answers with no result. Suggestions are only
//! produced on request through [`AiSauce::suggest_track_info`].

use crate::config::{AiSauceConfig, TAG_PLACEHOLDER};
use crate::types::{AlbumInfo, Item, TrackInfo, TrackInfoAiResponse};
use aisauce_common::llm::{ChatClient, LlmError};
use aisauce_common::SourceConfig;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Interface the host calls on every metadata source
pub trait MetadataSourcePlugin {
    fn name(&self) -> &'static str;

    fn album_for_id(&self, album_id: &str) -> Option<AlbumInfo>;

    fn track_for_id(&self, track_id: &str) -> Option<TrackInfo>;

    fn candidates(&self, items: &[Item], artist: &str, album: &str, va_likely: bool) -> Vec<AlbumInfo>;

    fn item_candidates(&self, item: &Item, artist: &str, title: &str) -> Vec<TrackInfo>;
}

#[derive(Debug, Error)]
pub enum SuggestError {
    #[error("No API key configured, suggestions disabled")]
    Disabled,

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Prompt rendering failed: {0}")]
    Prompt(String),
}

pub struct AiSauce {
    source: SourceConfig,
    client: Option<ChatClient>,
}

impl AiSauce {
    /// Build the plugin. Without an API key the host surface still works but
    /// suggestions return [`SuggestError::Disabled`].
    pub fn new(config: &AiSauceConfig) -> Self {
        let source = config.source();
        let client = match ChatClient::new(source.provider.clone()) {
            Ok(client) => {
                info!(provider = %source.provider.id, model = %source.provider.model, "AISauce suggestions enabled");
                Some(client)
            }
            Err(e) => {
                warn!("AISauce suggestions disabled: {}", e);
                None
            }
        };

        Self { source, client }
    }

    pub fn suggestions_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Render the user prompt for `item`
    pub fn render_prompt(&self, item: &Item) -> Result<String, SuggestError> {
        let dump = serde_json::to_string_pretty(&item.prompt_fields())
            .map_err(|e| SuggestError::Prompt(e.to_string()))?;
        Ok(self.source.user_prompt.replacen(TAG_PLACEHOLDER, &dump, 1))
    }

    /// Ask the model for cleaned-up track metadata
    pub async fn suggest_track_info(&self, item: &Item) -> Result<TrackInfo, SuggestError> {
        let client = self.client.as_ref().ok_or(SuggestError::Disabled)?;
        let prompt = self.render_prompt(item)?;

        debug!(path = %item.path.display(), "Requesting track suggestion");
        let response: TrackInfoAiResponse = client
            .structured(Some(&self.source.system_prompt), &prompt)
            .await?;

        Ok(response.into())
    }
}

impl MetadataSourcePlugin for AiSauce {
    fn name(&self) -> &'static str {
        "aisauce"
    }

    fn album_for_id(&self, album_id: &str) -> Option<AlbumInfo> {
        debug!(album_id, "Album lookup by id is not supported");
        None
    }

    fn track_for_id(&self, track_id: &str) -> Option<TrackInfo> {
        debug!(track_id, "Track lookup by id is not supported");
        None
    }

    fn candidates(&self, items: &[Item], _artist: &str, _album: &str, _va_likely: bool) -> Vec<AlbumInfo> {
        debug!(items = items.len(), "No album candidates");
        Vec::new()
    }

    fn item_candidates(&self, _item: &Item, _artist: &str, _title: &str) -> Vec<TrackInfo> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn offline_plugin() -> AiSauce {
        AiSauce::new(&AiSauceConfig::default())
    }

    #[test]
    fn test_lookups_return_nothing() {
        let plugin = offline_plugin();
        let item = Item {
            title: "Gimme Some More".to_string(),
            ..Item::default()
        };

        assert_eq!(plugin.name(), "aisauce");
        assert!(plugin.album_for_id("some_album_id").is_none());
        assert!(plugin.track_for_id("some_track_id").is_none());
        assert!(plugin.candidates(&[item.clone()], "Busta Rhymes", "", false).is_empty());
        assert!(plugin.item_candidates(&item, "Busta Rhymes", "Gimme Some More").is_empty());
    }

    #[test]
    fn test_render_prompt_embeds_fields() {
        let plugin = offline_plugin();
        let item = Item {
            path: PathBuf::from("track.mp3"),
            artist: "winslow".to_string(),
            ..Item::default()
        };

        let prompt = plugin.render_prompt(&item).unwrap();
        assert!(prompt.starts_with("Clean up the following metadata:"));
        assert!(prompt.contains("\"ARTIST\""));
        assert!(prompt.contains("track.mp3"));
        assert!(!prompt.contains(TAG_PLACEHOLDER));
    }

    #[tokio::test]
    async fn test_suggest_without_key_is_disabled() {
        let plugin = offline_plugin();
        assert!(!plugin.suggestions_enabled());

        let err = plugin.suggest_track_info(&Item::default()).await.unwrap_err();
        assert!(matches!(err, SuggestError::Disabled));
    }
}
