//! Video input and frame handling.
//!
//! This module provides abstractions for decoding frames from a video
//! and checking that the video matches the overlay layout. The source
//! owns the read cursor; everything downstream only borrows frames.

mod config;
mod frame;
mod source;
#[cfg(feature = "video")]
mod video;

pub use config::CaptureConfig;
pub use frame::Frame;
pub use source::{FrameSource, SourceError, SyntheticVideo, VideoInfo};
#[cfg(feature = "video")]
pub use video::VideoFile;
