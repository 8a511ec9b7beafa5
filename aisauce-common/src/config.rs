//! Configuration file discovery, TOML loading and LLM provider settings
//!
//! Every AISauce component resolves its options with the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! This module owns the parts shared by all components: where the TOML file
//! lives, how it is parsed, and the provider block used to reach the LLM.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directory name used under the platform config and data directories
pub const APP_DIR_NAME: &str = "aisauce";

/// Default OpenAI-compatible endpoint
pub const DEFAULT_API_BASE_URL: &str = "https://api.deepseek.com";

/// Default chat model
pub const DEFAULT_MODEL: &str = "deepseek-chat";

/// Logging section of a TOML config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level or `EnvFilter` directive (overridden by `RUST_LOG`)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// An OpenAI-compatible API provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Provider {
    /// Free-form identifier, used in logs only
    pub id: String,
    /// Bearer token sent with every request
    pub api_key: String,
    /// Base URL; `/chat/completions` is appended
    pub api_base_url: String,
    /// Model name passed through verbatim
    pub model: String,
}

impl Provider {
    /// True when an API key is present
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl Default for Provider {
    fn default() -> Self {
        Self {
            id: "deepseek".to_string(),
            api_key: String::new(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = if self.has_api_key() { "<redacted>" } else { "<unset>" };
        f.debug_struct("Provider")
            .field("id", &self.id)
            .field("api_key", &key)
            .field("api_base_url", &self.api_base_url)
            .field("model", &self.model)
            .finish()
    }
}

/// A provider together with the prompts sent to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub provider: Provider,
    pub user_prompt: String,
    pub system_prompt: String,
}

/// Resolve the path of a TOML config file.
///
/// Priority: explicit path → `env_var_name` → `<config_dir>/aisauce/<file_name>`.
/// The platform default is only returned when the file exists; explicit
/// paths are returned as given so that a typo surfaces as an error later.
pub fn resolve_config_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    file_name: &str,
) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let default_path = dirs::config_dir()?.join(APP_DIR_NAME).join(file_name);
    if default_path.exists() {
        Some(default_path)
    } else {
        debug!("No config file at {}", default_path.display());
        None
    }
}

/// Load a TOML file into `T`.
///
/// A missing file is not an error: a warning is logged and `T::default()` is
/// returned. A file that exists but does not parse is a configuration error.
pub fn load_toml<T>(path: Option<&Path>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        return Ok(T::default());
    };

    if !path.exists() {
        warn!(
            "Config file {} not found, using defaults",
            path.display()
        );
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Interpret a switch value the way the shell-facing options always have:
/// `true`, `1` and `yes` (any case) are true, everything else is false.
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}

/// Platform data directory for AISauce state (database, etc.)
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("./aisauce_data"))
}
