//! Read-failure tracking.
//!
//! Counts consecutive frames whose velocity could not be read and
//! decides when a lost lock must be regained by searching.

use crate::config::ConfigError;
use crate::sync::MatchPredicate;
use serde::{Deserialize, Serialize};

/// Recovery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Consecutive unreadable frames that trigger a resync.
    pub failure_threshold: u32,
    /// How far below the last good velocity a resync may land.
    pub margin: u32,
    /// Consecutive frames at or above the floor that confirm resync.
    pub confirm_frames: usize,
    /// End the run once velocity reaches this value.
    pub stop_at_velocity: Option<u32>,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            margin: 1000,
            confirm_frames: 3,
            stop_at_velocity: None,
        }
    }
}

impl RecoveryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.failure_threshold == 0 {
            return Err(ConfigError::InvalidFailureThreshold);
        }
        if self.confirm_frames == 0 {
            return Err(ConfigError::InvalidConfirmFrames);
        }
        Ok(())
    }
}

/// Failure counter and last known-good velocity.
#[derive(Debug, Clone, Default)]
pub struct RecoveryState {
    consecutive_failures: u32,
    last_good: u32,
}

impl RecoveryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful read and clears the failure run.
    pub fn record_success(&mut self, velocity: u32) {
        if self.consecutive_failures > 0 {
            tracing::trace!(
                failures = self.consecutive_failures,
                velocity,
                "Velocity readable again"
            );
        }
        self.consecutive_failures = 0;
        self.last_good = velocity;
    }

    /// Records an unreadable frame.
    ///
    /// Returns true once the failure run has reached the threshold.
    pub fn record_failure(&mut self, config: &RecoveryConfig) -> bool {
        self.consecutive_failures += 1;
        self.consecutive_failures >= config.failure_threshold
    }

    /// Clears the failure run after a successful resync.
    pub fn reset(&mut self) {
        self.consecutive_failures = 0;
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn last_good(&self) -> u32 {
        self.last_good
    }

    /// Lowest velocity accepted when resynchronizing.
    pub fn floor(&self, config: &RecoveryConfig) -> u32 {
        self.last_good.saturating_sub(config.margin)
    }

    /// Expected sequence that confirms the signal has resumed.
    pub fn resync_sequence(&self, config: &RecoveryConfig) -> Vec<MatchPredicate> {
        vec![MatchPredicate::AtLeast(self.floor(config)); config.confirm_frames]
    }
}
