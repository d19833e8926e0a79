//! Row output for a telemetry series.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while writing a series.
#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("failed to write series: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode series row: {0}")]
    Csv(#[from] csv::Error),
}

/// What the first column of each row holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeColumn {
    /// Seconds since telemetry start.
    #[default]
    Seconds,
    /// Frame offset from telemetry start.
    Frame,
}

/// Output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub time_column: TimeColumn,
}
