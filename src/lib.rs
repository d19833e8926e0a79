//! Launch Telemetry Library
//!
//! Extracts a velocity and altitude time series from the telemetry
//! overlay burned into a rocket launch broadcast.
//!
//! # Architecture
//!
//! The system follows an explicit data flow:
//!
//! ```text
//! capture → recognition → sync → pipeline → series
//!                ↓                   ↓
//!            training             metrics
//! ```
//!
//! # Design Principles
//!
//! - **Frame-aligned output**: sample `i` always belongs to frame `start + i`;
//!   frames without a usable reading are zero-filled
//! - **Strict digits**: the velocity field is read slot by slot and rejected
//!   unless every slot is a single digit
//! - **Engine behind a trait**: recognition and decoding are collaborators
//!   that tests replace with scripted mocks
//!
//! # Example
//!
//! ```no_run
//! use launch_telemetry::{
//!     capture::{CaptureConfig, SyntheticVideo},
//!     pipeline::{PipelineConfig, TelemetryPipeline},
//!     recognition::ScriptedReader,
//! };
//!
//! let config = PipelineConfig {
//!     capture: CaptureConfig::with_dimensions(64, 36),
//!     ..Default::default()
//! };
//! let pipeline = TelemetryPipeline::new(config).unwrap();
//!
//! let mut video = SyntheticVideo::with_length(120, 64, 36);
//! let mut reader = ScriptedReader::new().with_velocities(0, &[Some(0), Some(1), Some(2)]);
//!
//! let run = pipeline.run(&mut video, &mut reader).unwrap();
//! println!("{} samples from frame {}", run.series.len(), run.stats.telemetry_start);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod config;
pub mod metrics;
pub mod pipeline;
pub mod recognition;
pub mod series;
pub mod sync;
pub mod training;

// Re-export commonly used types at crate root
pub use capture::{CaptureConfig, Frame, FrameSource, SyntheticVideo, VideoInfo};
pub use config::{ConfigError, FileConfig};
pub use pipeline::{PipelineConfig, PipelineError, RunEnd, TelemetryPipeline, TelemetryRun};
pub use recognition::{OverlayReader, Reading, Recognizer, TelemetryReader};
pub use series::{TelemetrySample, TelemetrySeries, TimeColumn};
pub use sync::{Lock, MatchPredicate, SyncSearch};
pub use training::{GlyphCollector, GlyphConfig};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
