//! Two-phase search for a known run of velocity readings.
//!
//! A coarse scan jumps through the video in large strides until the
//! overlay shows up at all, then backs up one stride. A fine pass then
//! reads every frame until the expected sequence matches without a break.

use super::{MatchPredicate, SequenceMatcher};
use crate::capture::{FrameSource, SourceError, VideoInfo};
use crate::config::ConfigError;
use crate::recognition::{Reading, RecognizeError, TelemetryReader};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort a search.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("expected sequence is empty")]
    EmptySequence,
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Recognize(#[from] RecognizeError),
}

/// Search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Length of one coarse scan step.
    pub coarse_stride_seconds: f64,
    /// Velocities the overlay shows at liftoff, in order.
    pub liftoff_sequence: Vec<u32>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            coarse_stride_seconds: 30.0,
            liftoff_sequence: vec![0, 1],
        }
    }
}

impl SyncConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.coarse_stride_seconds.is_finite() || self.coarse_stride_seconds <= 0.0 {
            return Err(ConfigError::InvalidStride(self.coarse_stride_seconds));
        }
        if self.liftoff_sequence.is_empty() {
            return Err(ConfigError::EmptyLiftoffSequence);
        }
        Ok(())
    }

    /// The liftoff sequence as exact-match predicates.
    pub fn liftoff_predicates(&self) -> Vec<MatchPredicate> {
        self.liftoff_sequence
            .iter()
            .map(|&v| MatchPredicate::Exact(v))
            .collect()
    }
}

/// A confirmed match of the expected sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lock {
    /// Index of the frame that matched the first predicate.
    pub start: u64,
    /// Source position after the frame that matched the last predicate.
    pub end: u64,
}

/// Locates the first run of frames matching an expected sequence.
#[derive(Debug, Clone)]
pub struct SyncSearch {
    stride_seconds: f64,
}

impl SyncSearch {
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            stride_seconds: config.coarse_stride_seconds,
        }
    }

    /// Coarse step in frames for the given video.
    pub fn stride_frames(&self, info: &VideoInfo) -> u64 {
        info.frames_for(self.stride_seconds).max(1)
    }

    /// Searches forward from the source's current position.
    ///
    /// Returns `None` if the end of the video is reached first. The
    /// search never looks at frames before the position it started from.
    /// On success the source is positioned at `lock.end`.
    pub fn find_start<S, R>(
        &self,
        source: &mut S,
        reader: &mut R,
        expected: &[MatchPredicate],
    ) -> Result<Option<Lock>, SyncError>
    where
        S: FrameSource + ?Sized,
        R: TelemetryReader + ?Sized,
    {
        if expected.is_empty() {
            return Err(SyncError::EmptySequence);
        }

        if !self.coarse_scan(source, reader)? {
            return Ok(None);
        }
        self.confirm(source, reader, expected)
    }

    /// Steps forward until any velocity is readable, then rewinds one
    /// stride (but not past the origin) so the true start is bracketed.
    fn coarse_scan<S, R>(&self, source: &mut S, reader: &mut R) -> Result<bool, SyncError>
    where
        S: FrameSource + ?Sized,
        R: TelemetryReader + ?Sized,
    {
        let stride = self.stride_frames(&source.info());
        let origin = source.position();

        loop {
            let stop = source.position();
            let Some(frame) = source.next_frame()? else {
                tracing::debug!(origin, stop, "Coarse scan reached end of video");
                return Ok(false);
            };

            if let Reading::Value(velocity) = reader.scan_velocity(&frame)? {
                let rewind = stop.saturating_sub(stride).max(origin);
                tracing::debug!(stop, velocity, rewind, "Overlay found by coarse scan");
                source.seek(rewind)?;
                return Ok(true);
            }

            tracing::trace!(stop, "No overlay at coarse stop");
            source.seek(stop + stride)?;
        }
    }

    /// Reads every frame until the expected sequence matches.
    fn confirm<S, R>(
        &self,
        source: &mut S,
        reader: &mut R,
        expected: &[MatchPredicate],
    ) -> Result<Option<Lock>, SyncError>
    where
        S: FrameSource + ?Sized,
        R: TelemetryReader + ?Sized,
    {
        let mut matcher = SequenceMatcher::new(expected);

        while let Some(frame) = source.next_frame()? {
            // Unreadable frames neither advance nor reset the match.
            let Reading::Value(velocity) = reader.velocity(&frame)? else {
                continue;
            };

            tracing::trace!(frame = frame.index(), velocity, cursor = matcher.cursor(), "Confirming");
            if let Some(start) = matcher.observe(frame.index(), velocity) {
                let lock = Lock {
                    start,
                    end: source.position(),
                };
                tracing::debug!(start = lock.start, end = lock.end, "Sequence confirmed");
                return Ok(Some(lock));
            }
        }

        tracing::debug!("Confirmation reached end of video");
        Ok(None)
    }
}

impl Default for SyncSearch {
    fn default() -> Self {
        Self::new(&SyncConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::SyntheticVideo;
    use crate::recognition::ScriptedReader;
    use MatchPredicate::{AtLeast, Exact};

    const LIFTOFF: [MatchPredicate; 2] = [Exact(0), Exact(1)];

    fn search(stride_seconds: f64) -> SyncSearch {
        SyncSearch::new(&SyncConfig {
            coarse_stride_seconds: stride_seconds,
            ..Default::default()
        })
    }

    fn video(frames: u64) -> SyntheticVideo {
        SyntheticVideo::with_length(frames, 16, 9)
    }

    #[test]
    fn test_stride_from_frame_rate() {
        let info = VideoInfo::new(29.97, 1000, 1280, 720);
        assert_eq!(SyncSearch::default().stride_frames(&info), 899);
        assert_eq!(search(0.001).stride_frames(&info), 1);
    }

    #[test]
    fn test_finds_liftoff_after_long_preroll() {
        let mut source = video(200);
        let mut reader = ScriptedReader::new()
            .with_velocities(95, &[Some(0), Some(0), Some(1), Some(2)])
            .with_velocities(99, &vec![Some(3); 101]);

        // 1s stride at 30fps: stops at 0, 30, 60, 90 miss; 120 hits.
        let lock = search(1.0)
            .find_start(&mut source, &mut reader, &LIFTOFF)
            .unwrap()
            .unwrap();

        assert_eq!(lock, Lock { start: 96, end: 98 });
        assert_eq!(source.position(), 98);
    }

    #[test]
    fn test_unreadable_frames_do_not_break_confirmation() {
        let mut source = video(10);
        // Coarse scan needs a readable stop at the origin.
        let mut reader = ScriptedReader::new()
            .with_velocities(0, &[None, Some(0), None, Some(1)])
            .with_scan_only(0, 0);

        let lock = search(1.0)
            .find_start(&mut source, &mut reader, &LIFTOFF)
            .unwrap();

        assert_eq!(lock, Some(Lock { start: 1, end: 4 }));
    }

    #[test]
    fn test_mismatch_fails_first_attempt() {
        let mut source = video(6);
        let mut reader = ScriptedReader::new().with_velocities(0, &[Some(0), Some(5), Some(1)]);

        let lock = search(1.0)
            .find_start(&mut source, &mut reader, &LIFTOFF)
            .unwrap();
        assert_eq!(lock, None);
    }

    #[test]
    fn test_no_overlay_exhausts_coarse_scan() {
        let mut source = video(500);
        let mut reader = ScriptedReader::new();

        let lock = search(1.0)
            .find_start(&mut source, &mut reader, &LIFTOFF)
            .unwrap();

        assert_eq!(lock, None);
        // One read per stop: 0, 30, ..., 480.
        assert_eq!(reader.velocity_reads(), 17);
    }

    #[test]
    fn test_rewind_never_goes_before_origin() {
        let mut source = video(100);
        let mut reader = ScriptedReader::new()
            .with_velocities(10, &[Some(500); 10])
            .with_velocities(40, &[Some(2990), Some(2995), Some(3000)]);
        source.seek(40).unwrap();

        let lock = search(1.0)
            .find_start(&mut source, &mut reader, &[AtLeast(1990); 3])
            .unwrap();

        assert_eq!(lock, Some(Lock { start: 40, end: 43 }));
    }

    #[test]
    fn test_scan_only_frame_brackets_start() {
        let mut source = video(100);
        let mut reader = ScriptedReader::new()
            .with_scan_only(60, 0)
            .with_velocities(50, &[Some(0), Some(1)]);

        let lock = search(1.0)
            .find_start(&mut source, &mut reader, &LIFTOFF)
            .unwrap();

        assert_eq!(lock, Some(Lock { start: 50, end: 52 }));
    }

    #[test]
    fn test_empty_sequence_rejected() {
        let mut source = video(10);
        let mut reader = ScriptedReader::new();

        assert!(matches!(
            search(1.0).find_start(&mut source, &mut reader, &[]),
            Err(SyncError::EmptySequence)
        ));
    }
}
