//! Prometheus metrics for telemetry runs.
//!
//! A finished run is summarized into a [`MetricsSnapshot`] and recorded
//! in a [`MetricsRegistry`], which can be encoded in the Prometheus text
//! format and written next to the series.
//!
//! # Metrics Exposed
//!
//! ## Frame Counters
//! - `launch_telemetry_frames_processed_total` - Frames read after telemetry start
//! - `launch_telemetry_read_failures_total` - Frames with unreadable velocity
//! - `launch_telemetry_recoveries_total` - Successful resynchronizations
//! - `launch_telemetry_padded_frames_total` - Zero-filled samples
//!
//! ## Series State
//! - `launch_telemetry_series_length` - Samples in the series
//! - `launch_telemetry_start_frame` - Frame index of telemetry start
//! - `launch_telemetry_last_velocity` - Last velocity read
//! - `launch_telemetry_lock_lost` - 1 if the run ended without regaining lock
//!
//! # Example
//!
//! ```no_run
//! use launch_telemetry::metrics::{MetricsRegistry, MetricsSnapshot};
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//!
//! let snapshot = MetricsSnapshot {
//!     frames_processed: 540,
//!     read_failures: 12,
//!     recoveries: 1,
//!     padded_frames: 14,
//!     series_length: 542,
//!     telemetry_start: 1830,
//!     last_velocity: 7420,
//!     lock_lost: false,
//! };
//!
//! registry.update(&snapshot);
//! println!("{}", registry.encode().unwrap());
//! ```

mod collector;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
