//! Configuration resolution for the bootleg downloader
//!
//! Every option resolves with CLI → ENV → TOML → default priority and is
//! validated once at startup. Components receive their own slice of the
//! result (placement policy, tweaks, provider) instead of reading the
//! environment themselves.

use aisauce_common::config::{default_data_dir, parse_bool, LoggingConfig};
use aisauce_common::{Error, Provider, Result, SourceConfig};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::services::placement::{CollisionPolicy, PlacementPolicy};
use crate::services::prompts::{self, PromptVariant, TAG_PLACEHOLDER};
use crate::services::tweaks::UserTweaks;
use crate::workflow::PipelineConfig;

/// Config file name under `<config_dir>/aisauce/`
pub const CONFIG_FILE_NAME: &str = "bootleg.toml";

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "BTL_CONFIG";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:5724";
pub const DEFAULT_JOB_TIMEOUT_SECS: u64 = 600;

/// `[provider]` table of the config file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProviderToml {
    pub api_key: Option<String>,
    pub api_base_url: Option<String>,
    pub model: Option<String>,
}

/// Contents of `bootleg.toml`; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BootlegToml {
    pub download_base_path: Option<PathBuf>,
    pub create_album_dir: Option<bool>,
    pub clean_all_tags: Option<bool>,
    pub ensure_in_title: Option<String>,
    pub title_as_album: Option<bool>,
    pub album_override: Option<String>,
    pub album_artist_override: Option<String>,
    pub youtube_infer_artist: Option<bool>,
    pub on_collision: Option<String>,
    pub soundcloud_auth_token: Option<String>,
    pub ytdlp_path: Option<String>,
    pub scdl_path: Option<String>,
    pub temp_dir: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub listen_addr: Option<String>,
    pub job_timeout_secs: Option<u64>,
    pub system_prompt: Option<String>,
    pub user_prompt: Option<String>,
    pub prompt_variant: Option<String>,
    pub provider: ProviderToml,
    pub logging: LoggingConfig,
}

/// Options that can be given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub download_base_path: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub listen_addr: Option<String>,
    pub temp_dir: Option<PathBuf>,
    pub on_collision: Option<String>,
    pub job_timeout_secs: Option<u64>,
}

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct BootlegConfig {
    pub download_base_path: PathBuf,
    pub create_album_dir: bool,
    pub clean_all_tags: bool,
    pub tweaks: UserTweaks,
    pub youtube_infer_artist: bool,
    pub on_collision: CollisionPolicy,
    pub soundcloud_auth_token: Option<String>,
    pub ytdlp_path: String,
    pub scdl_path: String,
    pub temp_dir: PathBuf,
    pub database_path: PathBuf,
    pub listen_addr: SocketAddr,
    pub job_timeout: Duration,
    pub prompt_variant: PromptVariant,
    /// Provider and prompts for metadata cleanup
    pub source: SourceConfig,
    pub logging: LoggingConfig,
}

impl BootlegConfig {
    /// Resolve against the process environment
    pub fn from_env(cli: &CliOverrides, toml: BootlegToml) -> Result<Self> {
        Self::resolve(cli, toml, |name| std::env::var(name).ok())
    }

    /// Resolve with an explicit environment lookup
    pub fn resolve<F>(cli: &CliOverrides, toml: BootlegToml, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty variables count as unset
        let env = |name: &str| env(name).filter(|v| !v.trim().is_empty());
        let env_bool = |name: &str| env(name).map(|v| parse_bool(&v));

        let download_base_path = cli
            .download_base_path
            .clone()
            .or_else(|| env("BTL_DOWNLOAD_BASE_PATH").map(PathBuf::from))
            .or(toml.download_base_path)
            .ok_or_else(|| {
                Error::Config(
                    "Download base path not configured. Set one of:\n\
                     1. CLI: --base-path /music/inbox\n\
                     2. Environment: BTL_DOWNLOAD_BASE_PATH=/music/inbox\n\
                     3. TOML config: download_base_path = \"/music/inbox\""
                        .to_string(),
                )
            })?;

        let on_collision_raw = cli
            .on_collision
            .clone()
            .or_else(|| env("BTL_ON_COLLISION"))
            .or(toml.on_collision);
        let on_collision = match on_collision_raw {
            Some(raw) => CollisionPolicy::parse(&raw).ok_or_else(|| {
                Error::Config(format!(
                    "Invalid collision policy '{}', expected overwrite, fail or rename",
                    raw
                ))
            })?,
            None => CollisionPolicy::default(),
        };

        let prompt_variant = match env("DS_PROMPT_VARIANT").or(toml.prompt_variant) {
            Some(raw) => PromptVariant::parse(&raw).ok_or_else(|| {
                Error::Config(format!("Invalid prompt variant '{}', expected default or genres", raw))
            })?,
            None => PromptVariant::Default,
        };

        let listen_raw = cli
            .listen_addr
            .clone()
            .or_else(|| env("BTL_LISTEN_ADDR"))
            .or(toml.listen_addr)
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr: SocketAddr = listen_raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid listen address '{}': {}", listen_raw, e)))?;

        let job_timeout_secs = match cli.job_timeout_secs {
            Some(secs) => secs,
            None => match env("BTL_JOB_TIMEOUT_SECS") {
                Some(raw) => raw.trim().parse().map_err(|e| {
                    Error::Config(format!("Invalid BTL_JOB_TIMEOUT_SECS '{}': {}", raw, e))
                })?,
                None => toml.job_timeout_secs.unwrap_or(DEFAULT_JOB_TIMEOUT_SECS),
            },
        };
        if job_timeout_secs == 0 {
            return Err(Error::Config("Job timeout must be greater than zero".to_string()));
        }

        let provider = resolve_provider(&env, toml.provider);

        let system_prompt = env("DS_SYSTEM_PROMPT")
            .or(toml.system_prompt)
            .unwrap_or_else(|| prompts::SYSTEM_PROMPT.to_string());
        let user_prompt = env("DS_USER_PROMPT")
            .or(toml.user_prompt)
            .unwrap_or_else(|| prompt_variant.user_prompt().to_string());
        if !user_prompt.contains(TAG_PLACEHOLDER) {
            warn!("User prompt has no {} placeholder; tags will not be sent", TAG_PLACEHOLDER);
        }

        let tweaks = UserTweaks {
            ensure_in_title: env("BTL_ENSURE_THIS_STR_IN_TITLE").or(toml.ensure_in_title),
            title_as_album: env_bool("BTL_TITLE_AS_ALBUM")
                .or(toml.title_as_album)
                .unwrap_or(false),
            album_override: env("BTL_ALBUM_OVERRIDE").or(toml.album_override),
            album_artist_override: env("BTL_ALBUMARTIST_OVERRIDE").or(toml.album_artist_override),
        };

        let config = Self {
            download_base_path,
            create_album_dir: env_bool("BTL_CREATE_ALBUM_DIR")
                .or(toml.create_album_dir)
                .unwrap_or(true),
            clean_all_tags: env_bool("BTL_CLEAN_ALL_TAGS")
                .or(toml.clean_all_tags)
                .unwrap_or(false),
            tweaks,
            youtube_infer_artist: env_bool("BTL_YT_INFER_ARTIST")
                .or(toml.youtube_infer_artist)
                .unwrap_or(true),
            on_collision,
            soundcloud_auth_token: env("BTL_SOUNDCLOUD_AUTH_TOKEN").or(toml.soundcloud_auth_token),
            ytdlp_path: env("BTL_YTDLP_PATH")
                .or(toml.ytdlp_path)
                .unwrap_or_else(|| "yt-dlp".to_string()),
            scdl_path: env("BTL_SCDL_PATH")
                .or(toml.scdl_path)
                .unwrap_or_else(|| "scdl".to_string()),
            temp_dir: cli
                .temp_dir
                .clone()
                .or_else(|| env("BTL_TEMP_DIR").map(PathBuf::from))
                .or(toml.temp_dir)
                .unwrap_or_else(|| std::env::temp_dir().join("aisauce-bootleg")),
            database_path: cli
                .database_path
                .clone()
                .or_else(|| env("BTL_DATABASE_PATH").map(PathBuf::from))
                .or(toml.database_path)
                .unwrap_or_else(|| default_data_dir().join("bootleg.db")),
            listen_addr,
            job_timeout: Duration::from_secs(job_timeout_secs),
            prompt_variant,
            source: SourceConfig {
                provider,
                user_prompt,
                system_prompt,
            },
            logging: toml.logging,
        };

        debug!(config = ?config, "Configuration resolved");
        Ok(config)
    }

    /// True when an LLM API key is configured
    pub fn cleanup_enabled(&self) -> bool {
        self.source.provider.has_api_key()
    }

    pub fn placement_policy(&self) -> PlacementPolicy {
        PlacementPolicy {
            base: self.download_base_path.clone(),
            create_album_dir: self.create_album_dir,
            on_collision: self.on_collision,
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            placement: self.placement_policy(),
            tweaks: self.tweaks.clone(),
            clean_all_tags: self.clean_all_tags,
            youtube_infer_artist: self.youtube_infer_artist,
            temp_root: self.temp_dir.clone(),
        }
    }
}

fn resolve_provider<F>(env: &F, toml: ProviderToml) -> Provider
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = Provider::default();

    let env_key = env("DS_API_KEY");
    let toml_key = toml.api_key.filter(|k| !k.trim().is_empty());
    if env_key.is_some() && toml_key.is_some() {
        warn!("LLM API key found in environment and TOML config. Using environment.");
    }

    let api_key = match (env_key, toml_key) {
        (Some(key), _) => {
            info!("LLM API key loaded from environment variable");
            key
        }
        (None, Some(key)) => {
            info!("LLM API key loaded from TOML config");
            key
        }
        (None, None) => {
            warn!("No LLM API key configured (DS_API_KEY); metadata cleanup disabled");
            String::new()
        }
    };

    Provider {
        id: defaults.id,
        api_key,
        api_base_url: env("DS_API_BASE_URL")
            .or(toml.api_base_url)
            .unwrap_or(defaults.api_base_url),
        model: env("DS_MODEL").or(toml.model).unwrap_or(defaults.model),
    }
}
