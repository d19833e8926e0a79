//! Video capture configuration.
//!
//! The overlay geometry is only meaningful at one resolution, so the
//! expected frame size is checked before any frame is read.

use super::VideoInfo;
use crate::config::ConfigError;
use serde::{Deserialize, Serialize};

/// Configuration for opening the input video.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Expected frame width in pixels.
    pub width: u32,
    /// Expected frame height in pixels.
    pub height: u32,
    /// Skip this many seconds of video before searching for liftoff.
    pub start_at_seconds: Option<f64>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            start_at_seconds: None,
        }
    }
}

impl CaptureConfig {
    /// Creates a new configuration with the specified dimensions.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if let Some(start) = self.start_at_seconds {
            if !start.is_finite() || start < 0.0 {
                return Err(ConfigError::InvalidStartOffset(start));
            }
        }
        Ok(())
    }

    /// Returns true if the opened video has the expected resolution.
    pub fn accepts(&self, info: &VideoInfo) -> bool {
        info.width == self.width && info.height == self.height
    }
}
