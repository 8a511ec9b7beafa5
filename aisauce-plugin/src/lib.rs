//! # AISauce Plugin
//!
//! Metadata-source plugin for a music library manager. Host lookups and
//! candidate searches answer with no result; the plugin's value is the
//! on-demand AI suggestion of cleaned-up track metadata.

pub mod config;
pub mod plugin;
pub mod types;

pub use config::AiSauceConfig;
pub use plugin::{AiSauce, MetadataSourcePlugin, SuggestError};
pub use types::{AlbumInfo, AlbumInfoAiResponse, Item, TrackInfo, TrackInfoAiResponse};
