//! Data models for the bootleg downloader
//!
//! - Minimal per-track metadata record
//! - Download / track records and their state machine

pub mod download;
pub mod metadata;

pub use download::{DownloadRecord, DownloadStatus, TrackRecord};
pub use metadata::{MinimalMetaData, TAG_KEYS};
