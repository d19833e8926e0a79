//! Telemetry extraction pipeline.
//!
//! Ties the pieces together over a single video: locate liftoff with
//! [`SyncSearch`](crate::sync::SyncSearch), read one sample per frame,
//! and resynchronize when the overlay stops reading.
//!
//! # Recovery
//!
//! After `failure_threshold` consecutive unreadable frames the pipeline
//! searches forward for `confirm_frames` consecutive velocities no lower
//! than `last_good - margin`. Frames skipped by the search are padded
//! with zero samples, so the series never loses alignment with the video.
//! If the search runs out of video the run ends with the samples
//! collected so far.

mod recovery;
mod runner;

pub use recovery::{RecoveryConfig, RecoveryState};
pub use runner::{
    PipelineConfig, PipelineError, PipelineState, PipelineStats, RecoveryEvent, RunEnd,
    TelemetryPipeline, TelemetryRun,
};
