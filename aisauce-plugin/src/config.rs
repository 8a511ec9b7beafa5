//! Plugin configuration
//!
//! Read from `aisauce.toml` (or the file named by `AISAUCE_CONFIG`). The
//! provider block is shared with the bootleg utility; prompts fall back to
//! compiled defaults when the file leaves them out.

use aisauce_common::config::{load_toml, resolve_config_path, LoggingConfig};
use aisauce_common::{Error, Provider, Result, SourceConfig};
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "aisauce.toml";
pub const CONFIG_ENV_VAR: &str = "AISAUCE_CONFIG";

/// Placeholder replaced by the item's tag dictionary
pub const TAG_PLACEHOLDER: &str = "{}";

pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are an expert in musical metadata. The user provides messy tags of a
single track, often a bootleg or an edit. Answer with a JSON object holding
title, artist, album, album_artist, genres, date and comment. Keep only the
year in date. Leave fields empty instead of inventing values.";

pub const DEFAULT_USER_PROMPT: &str = "Clean up the following metadata:\n{}";

/// Plugin settings as written in the TOML file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AiSauceConfig {
    pub provider: Provider,
    pub system_prompt: Option<String>,
    pub user_prompt: Option<String>,
    pub logging: LoggingConfig,
}

impl AiSauceConfig {
    /// Load from an explicit path, `AISAUCE_CONFIG`, or the platform default
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = resolve_config_path(path, CONFIG_ENV_VAR, CONFIG_FILE_NAME);
        let config: Self = load_toml(path.as_deref())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse plugin config failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if let Some(prompt) = &self.user_prompt {
            if !prompt.contains(TAG_PLACEHOLDER) {
                return Err(Error::Config(format!(
                    "user_prompt must contain the {} placeholder",
                    TAG_PLACEHOLDER
                )));
            }
        }
        Ok(())
    }

    /// Provider plus the effective prompts
    pub fn source(&self) -> SourceConfig {
        SourceConfig {
            provider: self.provider.clone(),
            user_prompt: self
                .user_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_PROMPT.to_string()),
            system_prompt: self
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
        }
    }
}
