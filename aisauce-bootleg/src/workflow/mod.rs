//! Download workflow
//!
//! - [`pipeline`]: one URL from download to placed, tagged file
//! - [`batch`]: a download's URLs in order, with status rollup and callback
//! - [`queue`]: single-worker job queue used by the HTTP server

pub mod batch;
pub mod pipeline;
pub mod queue;

pub use batch::BatchRunner;
pub use pipeline::{Pipeline, PipelineConfig, PlacedTrack, TrackFailure, TrackOutcome, TrackStage};
pub use queue::{DownloadQueue, QueueError};
