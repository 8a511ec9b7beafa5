//! # AISauce Common Library
//!
//! Shared code for the bootleg downloader and the metadata-source plugin:
//! - Error types
//! - TOML configuration file discovery and provider settings
//! - Tracing initialisation
//! - OpenAI-compatible structured chat completion client

pub mod config;
pub mod error;
pub mod llm;
pub mod logging;

pub use config::{Provider, SourceConfig};
pub use error::{Error, Result};
