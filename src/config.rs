//! Configuration file format and validation errors.

use crate::capture::CaptureConfig;
use crate::pipeline::{PipelineConfig, RecoveryConfig};
use crate::recognition::{OverlayLayout, RecognitionConfig, Region};
use crate::series::OutputConfig;
use crate::sync::SyncConfig;
use crate::training::GlyphConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid frame dimensions")]
    InvalidDimensions,
    #[error("invalid start offset {0}s")]
    InvalidStartOffset(f64),
    #[error("{field} region {region:?} lies outside the frame")]
    RegionOutOfFrame { field: &'static str, region: Region },
    #[error("velocity field has no digit slots")]
    NoDigitSlots,
    #[error("digit slot {0:?} lies outside the scaled velocity field")]
    SlotOutOfField(Region),
    #[error("invalid upscale factor {0} (must be 1-8)")]
    InvalidScale(u32),
    #[error("invalid coarse stride {0}s")]
    InvalidStride(f64),
    #[error("liftoff sequence is empty")]
    EmptyLiftoffSequence,
    #[error("failure threshold must be at least 1")]
    InvalidFailureThreshold,
    #[error("confirmation needs at least 1 frame")]
    InvalidConfirmFrames,
    #[error("samples per digit must be at least 1")]
    InvalidGlyphQuota,
    #[error("{0} is not a decimal digit")]
    InvalidDigit(u8),
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
    #[error("failed to serialize config: {0}")]
    SerializeError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub overlay: OverlayLayout,
    #[serde(default)]
    pub recognition: RecognitionConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub recovery: RecoveryConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub glyphs: GlyphConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }

    /// Validates every section, including the overlay against the frame size.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.capture.validate()?;
        self.recognition.validate()?;
        self.overlay
            .validate(self.capture.width, self.capture.height, self.recognition.scale)?;
        self.sync.validate()?;
        self.recovery.validate()?;
        self.glyphs.validate()
    }

    /// The settings the frame loop needs.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            capture: self.capture.clone(),
            sync: self.sync.clone(),
            recovery: self.recovery.clone(),
        }
    }
}
