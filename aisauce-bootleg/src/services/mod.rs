//! Service modules for the bootleg workflow
//!
//! Each stage of a track download lives in its own module: source detection,
//! extraction, tag access, cleanup, user tweaks, placement and the
//! completion callback.

pub mod callback;
pub mod cleanup;
pub mod downloader;
pub mod placement;
pub mod prompts;
pub mod source;
pub mod tags;
pub mod tweaks;

pub use callback::{CallbackError, CompletionPayload};
pub use cleanup::{CleanupError, DisabledCleaner, LlmCleaner, MetadataCleaner};
pub use downloader::{DownloadError, DownloadedFile, Downloader, ExternalDownloader};
pub use placement::{CollisionPolicy, PlacementError, PlacementPolicy};
pub use prompts::PromptVariant;
pub use source::{Source, SourceError};
pub use tags::{TagEditor, TagError, TagMap};
pub use tweaks::UserTweaks;
