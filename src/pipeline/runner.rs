//! The frame loop.
//!
//! Runs the pipeline state machine over one video:
//!
//! ```text
//! SearchingForStart → SteadyState ⇄ Recovering → Done
//! ```
//!
//! Every frame advanced past telemetry start produces exactly one
//! sample, padding included, so sample `i` is always video frame
//! `start + i`.

use super::recovery::{RecoveryConfig, RecoveryState};
use crate::capture::{CaptureConfig, FrameSource, SourceError};
use crate::config::ConfigError;
use crate::recognition::{Reading, RecognizeError, TelemetryReader};
use crate::series::{TelemetrySample, TelemetrySeries};
use crate::sync::{SyncConfig, SyncError, SyncSearch};
use thiserror::Error;

/// Fatal pipeline errors.
///
/// Losing lock is not an error; the run ends with a partial series.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{expected_width}x{expected_height} video expected, got {width}x{height}")]
    ResolutionMismatch {
        expected_width: u32,
        expected_height: u32,
        width: u32,
        height: u32,
    },
    #[error("couldn't locate start of telemetry")]
    TelemetryStartNotFound,
    #[error("expected sequence is empty")]
    EmptySequence,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Recognize(#[from] RecognizeError),
}

impl From<SyncError> for PipelineError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::EmptySequence => PipelineError::EmptySequence,
            SyncError::Source(e) => PipelineError::Source(e),
            SyncError::Recognize(e) => PipelineError::Recognize(e),
        }
    }
}

/// Settings for one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub capture: CaptureConfig,
    pub sync: SyncConfig,
    pub recovery: RecoveryConfig,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.capture.validate()?;
        self.sync.validate()?;
        self.recovery.validate()
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    /// The video ran out during steady state.
    EndOfVideo,
    /// Recovery reached the end of the video without regaining lock.
    LockLost {
        /// Source position when the failed recovery began.
        since: u64,
    },
    /// Velocity reached the configured stop value.
    StopVelocity,
}

/// Pipeline states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    SearchingForStart,
    SteadyState,
    Recovering,
    Done(RunEnd),
}

/// One successful resync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryEvent {
    /// Source position when the failure threshold was reached.
    pub detected_at: u64,
    /// First frame of the confirmed run steady state resumed from.
    pub resumed_at: u64,
}

impl RecoveryEvent {
    /// Frames skipped by the resync, each padded with a zero sample.
    pub fn skipped(&self) -> u64 {
        self.resumed_at - self.detected_at
    }
}

/// Counters collected during a run.
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Frame index of sample 0.
    pub telemetry_start: u64,
    /// Frames read in steady state.
    ///
    /// Reads made while searching for or regaining lock are not counted.
    /// A resync resumes at or after the frame where the loss was detected,
    /// so no frame is counted twice.
    pub frames_read: u64,
    /// Steady-state frames whose velocity was unreadable.
    pub read_failures: u64,
    /// Successful resyncs, in order.
    pub recoveries: Vec<RecoveryEvent>,
    /// Last successfully read velocity.
    pub last_velocity: u32,
}

impl PipelineStats {
    /// Zero samples inserted for frames skipped by resyncs.
    pub fn recovery_padding(&self) -> u64 {
        self.recoveries.iter().map(RecoveryEvent::skipped).sum()
    }
}

/// The output of a completed run.
#[derive(Debug, Clone)]
pub struct TelemetryRun {
    pub series: TelemetrySeries,
    pub stats: PipelineStats,
    pub end: RunEnd,
}

/// Extracts a telemetry series from a video.
pub struct TelemetryPipeline {
    config: PipelineConfig,
    search: SyncSearch,
}

impl TelemetryPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let search = SyncSearch::new(&config.sync);
        Ok(Self { config, search })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the pipeline to completion.
    ///
    /// The source and reader are used exclusively and strictly in
    /// sequence for the whole run.
    pub fn run<S, R>(&self, source: &mut S, reader: &mut R) -> Result<TelemetryRun, PipelineError>
    where
        S: FrameSource + ?Sized,
        R: TelemetryReader + ?Sized,
    {
        let info = source.info();
        if !self.config.capture.accepts(&info) {
            return Err(PipelineError::ResolutionMismatch {
                expected_width: self.config.capture.width,
                expected_height: self.config.capture.height,
                width: info.width,
                height: info.height,
            });
        }

        let mut series = TelemetrySeries::new(info.fps, 0);
        let mut stats = PipelineStats::default();
        let mut recovery = RecoveryState::new();
        let mut state = PipelineState::SearchingForStart;

        let end = loop {
            state = match state {
                PipelineState::SearchingForStart => {
                    let start = self.find_telemetry_start(source, reader)?;
                    series = TelemetrySeries::new(info.fps, start);
                    stats.telemetry_start = start;
                    PipelineState::SteadyState
                }
                PipelineState::SteadyState => {
                    self.steady_step(source, reader, &mut series, &mut stats, &mut recovery)?
                }
                PipelineState::Recovering => {
                    self.recover(source, reader, &mut series, &mut stats, &mut recovery)?
                }
                PipelineState::Done(end) => break end,
            };
        };

        tracing::info!(
            samples = series.len(),
            recoveries = stats.recoveries.len(),
            padded = series.padded(),
            end = ?end,
            "Telemetry run finished"
        );

        Ok(TelemetryRun { series, stats, end })
    }

    /// Locates liftoff and leaves the source on its first frame.
    fn find_telemetry_start<S, R>(&self, source: &mut S, reader: &mut R) -> Result<u64, PipelineError>
    where
        S: FrameSource + ?Sized,
        R: TelemetryReader + ?Sized,
    {
        if let Some(seconds) = self.config.capture.start_at_seconds {
            tracing::info!(seconds, "Skipping ahead before liftoff search");
            source.seek_time(seconds)?;
        }

        tracing::info!("Searching for liftoff");
        let expected = self.config.sync.liftoff_predicates();
        let lock = self
            .search
            .find_start(source, reader, &expected)?
            .ok_or(PipelineError::TelemetryStartNotFound)?;

        source.seek(lock.start)?;
        tracing::info!(
            frame = lock.start,
            seconds = lock.start as f64 / source.info().fps,
            "Liftoff located"
        );
        Ok(lock.start)
    }

    fn steady_step<S, R>(
        &self,
        source: &mut S,
        reader: &mut R,
        series: &mut TelemetrySeries,
        stats: &mut PipelineStats,
        recovery: &mut RecoveryState,
    ) -> Result<PipelineState, PipelineError>
    where
        S: FrameSource + ?Sized,
        R: TelemetryReader + ?Sized,
    {
        debug_assert_eq!(series.next_frame(), source.position());

        let Some(frame) = source.next_frame()? else {
            return Ok(PipelineState::Done(RunEnd::EndOfVideo));
        };
        stats.frames_read += 1;

        let velocity = match reader.velocity(&frame)? {
            Reading::Value(velocity) => velocity,
            Reading::Unreadable => {
                stats.read_failures += 1;
                series.pad(1);
                if recovery.record_failure(&self.config.recovery) {
                    return Ok(PipelineState::Recovering);
                }
                return Ok(PipelineState::SteadyState);
            }
        };

        let altitude = reader.altitude(&frame)?;
        let sample = TelemetrySample::from_readings(velocity, altitude);
        tracing::debug!(
            t = series.elapsed(series.len()),
            v = sample.velocity,
            d = sample.altitude_milli,
            "Sample"
        );

        series.push(sample);
        recovery.record_success(velocity);
        stats.last_velocity = velocity;

        match self.config.recovery.stop_at_velocity {
            Some(stop) if velocity >= stop => {
                tracing::info!(velocity, stop, "Stop velocity reached");
                Ok(PipelineState::Done(RunEnd::StopVelocity))
            }
            _ => Ok(PipelineState::SteadyState),
        }
    }

    fn recover<S, R>(
        &self,
        source: &mut S,
        reader: &mut R,
        series: &mut TelemetrySeries,
        stats: &mut PipelineStats,
        recovery: &mut RecoveryState,
    ) -> Result<PipelineState, PipelineError>
    where
        S: FrameSource + ?Sized,
        R: TelemetryReader + ?Sized,
    {
        let origin = source.position();
        let config = &self.config.recovery;
        tracing::warn!(
            frame = origin,
            failures = recovery.consecutive_failures(),
            last_good = recovery.last_good(),
            floor = recovery.floor(config),
            "Velocity lost, resynchronizing"
        );

        let expected = recovery.resync_sequence(config);
        let Some(lock) = self.search.find_start(source, reader, &expected)? else {
            tracing::warn!(since = origin, "Could not regain lock before end of video");
            return Ok(PipelineState::Done(RunEnd::LockLost { since: origin }));
        };

        let event = RecoveryEvent {
            detected_at: origin,
            resumed_at: lock.start.max(origin),
        };
        series.pad(event.skipped());
        source.seek(event.resumed_at)?;
        recovery.reset();
        stats.recoveries.push(event);

        tracing::info!(
            resumed_at = event.resumed_at,
            skipped = event.skipped(),
            "Lock regained"
        );
        Ok(PipelineState::SteadyState)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::SyntheticVideo;
    use crate::recognition::ScriptedReader;
    use proptest::prelude::*;

    const U: Option<u32> = None;

    fn config(stride_seconds: f64) -> PipelineConfig {
        PipelineConfig {
            capture: CaptureConfig::with_dimensions(16, 9),
            sync: SyncConfig {
                coarse_stride_seconds: stride_seconds,
                ..Default::default()
            },
            recovery: RecoveryConfig::default(),
        }
    }

    fn pipeline(stride_seconds: f64) -> TelemetryPipeline {
        TelemetryPipeline::new(config(stride_seconds)).unwrap()
    }

    fn video(frames: u64) -> SyntheticVideo {
        SyntheticVideo::with_length(frames, 16, 9)
    }

    fn velocities(run: &TelemetryRun) -> Vec<u32> {
        run.series.samples().iter().map(|s| s.velocity).collect()
    }

    #[test]
    fn test_recovery_after_five_unreadable_frames() {
        let mut source = video(24);
        let mut reader = ScriptedReader::new().with_velocities(
            10,
            &[
                Some(0), Some(1), Some(2), Some(3),
                U, U, U, U, U,
                Some(2998), Some(2999), Some(3000), Some(3001), Some(3002),
            ],
        );

        let run = pipeline(0.2).run(&mut source, &mut reader).unwrap();

        assert_eq!(run.stats.telemetry_start, 10);
        assert_eq!(
            velocities(&run),
            vec![0, 1, 2, 3, 0, 0, 0, 0, 0, 2998, 2999, 3000, 3001, 3002]
        );
        // Detected right after the fifth unreadable frame (frame 18).
        assert_eq!(
            run.stats.recoveries,
            vec![RecoveryEvent {
                detected_at: 19,
                resumed_at: 19
            }]
        );
        assert_eq!(run.stats.read_failures, 5);
        assert_eq!(run.end, RunEnd::EndOfVideo);
        assert_eq!(run.series.len() as u64, 24 - 10);
        assert_eq!(run.stats.frames_read, 14);
    }

    #[test]
    fn test_recovery_pads_skipped_frames() {
        let mut source = video(24);
        let mut reader = ScriptedReader::new().with_velocities(
            10,
            &[
                Some(0), Some(1), Some(2998),
                U, U, U, U, U,
                // Below the 1998 floor, then a gap, then the signal resumes.
                Some(1500), U, Some(3003), Some(3004), Some(3005), Some(3006),
            ],
        );

        let run = pipeline(0.2).run(&mut source, &mut reader).unwrap();

        let event = run.stats.recoveries[0];
        assert_eq!(event.detected_at, 18);
        assert_eq!(event.resumed_at, 20);
        assert_eq!(event.skipped(), 2);
        assert_eq!(
            velocities(&run),
            vec![0, 1, 2998, 0, 0, 0, 0, 0, 0, 0, 3003, 3004, 3005, 3006]
        );
        assert_eq!(run.stats.recovery_padding(), 2);
        assert_eq!(run.series.padded(), 7);
        // Frames 10..18 and 20..24; the skipped 18 and 19 are never read.
        assert_eq!(run.stats.frames_read, 12);
    }

    #[test]
    fn test_lock_lost_keeps_partial_series() {
        let mut source = video(60);
        let mut reader = ScriptedReader::new()
            .with_velocities(0, &[Some(0), Some(1), Some(5), Some(9)]);

        let run = pipeline(0.2).run(&mut source, &mut reader).unwrap();

        assert_eq!(run.end, RunEnd::LockLost { since: 9 });
        assert_eq!(velocities(&run), vec![0, 1, 5, 9, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_missing_liftoff_is_fatal() {
        let mut source = video(60);
        let mut reader = ScriptedReader::new().with_velocities(20, &[Some(7), Some(8), Some(9)]);

        assert!(matches!(
            pipeline(0.2).run(&mut source, &mut reader),
            Err(PipelineError::TelemetryStartNotFound)
        ));
    }

    #[test]
    fn test_wrong_resolution_is_fatal() {
        let mut source = SyntheticVideo::with_length(60, 1920, 1080);
        let mut reader = ScriptedReader::new();

        assert!(matches!(
            pipeline(0.2).run(&mut source, &mut reader),
            Err(PipelineError::ResolutionMismatch { width: 1920, .. })
        ));
    }

    #[test]
    fn test_refused_seek_is_fatal() {
        let mut source = video(24).refuse_seeks();
        let mut reader = ScriptedReader::new().with_velocities(10, &[Some(0), Some(1), Some(2)]);

        // Frame 0 shows no overlay, so the scan tries to jump to frame 6.
        assert!(matches!(
            pipeline(0.2).run(&mut source, &mut reader),
            Err(PipelineError::Source(SourceError::SeekFailed { index: 6, .. }))
        ));
    }

    #[test]
    fn test_start_offset_skips_decoy_liftoff() {
        let mut config = config(0.2);
        config.capture.start_at_seconds = Some(1.0);
        let pipeline = TelemetryPipeline::new(config).unwrap();

        let mut source = video(50);
        let mut reader = ScriptedReader::new()
            .with_velocities(2, &[Some(0), Some(1)])
            .with_velocities(40, &[Some(0), Some(1), Some(2)]);

        let run = pipeline.run(&mut source, &mut reader).unwrap();
        assert_eq!(run.stats.telemetry_start, 40);
    }

    #[test]
    fn test_stop_velocity_ends_run() {
        let mut config = config(0.2);
        config.recovery.stop_at_velocity = Some(3);
        let pipeline = TelemetryPipeline::new(config).unwrap();

        let mut source = video(20);
        let mut reader =
            ScriptedReader::new().with_velocities(0, &[Some(0), Some(1), Some(2), Some(3), Some(4)]);

        let run = pipeline.run(&mut source, &mut reader).unwrap();

        assert_eq!(run.end, RunEnd::StopVelocity);
        assert_eq!(velocities(&run), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_altitude_recorded_in_milli_units() {
        let mut source = video(4);
        let mut reader = ScriptedReader::new()
            .with_velocities(0, &[Some(0), Some(1), Some(2)])
            .with_altitudes(0, &[0.0, 0.012, 0.05]);

        let run = pipeline(0.2).run(&mut source, &mut reader).unwrap();

        let altitudes: Vec<u32> = run.series.samples().iter().map(|s| s.altitude_milli).collect();
        assert_eq!(altitudes, vec![0, 12, 50, 0]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = config(0.2);
        config.sync.liftoff_sequence.clear();

        assert!(matches!(
            TelemetryPipeline::new(config),
            Err(PipelineError::Config(ConfigError::EmptyLiftoffSequence))
        ));
    }

    fn script() -> impl Strategy<Value = Vec<Option<u32>>> {
        prop::collection::vec(prop::option::weighted(0.6, 1u32..5000), 0..80)
    }

    proptest! {
        #[test]
        fn prop_series_stays_aligned_with_frames(tail in script()) {
            let mut values = vec![U, U, U, Some(0), Some(1)];
            values.extend(tail);
            let frames = values.len() as u64;

            let pipeline = pipeline(1.0 / 30.0);
            let mut source = video(frames);
            let mut reader = ScriptedReader::new().with_velocities(0, &values);

            let run = pipeline.run(&mut source, &mut reader).unwrap();
            let start = run.stats.telemetry_start;
            prop_assert_eq!(start, 3);

            let expected_len = match run.end {
                RunEnd::EndOfVideo => frames - start,
                RunEnd::LockLost { since } => since - start,
                RunEnd::StopVelocity => unreachable!(),
            };
            prop_assert_eq!(run.series.len() as u64, expected_len);
            prop_assert_eq!(
                run.stats.frames_read,
                run.series.len() as u64 - run.stats.recovery_padding()
            );

            // Every non-padding sample is the value shown on its frame.
            for (i, sample) in run.series.samples().iter().enumerate() {
                if sample.velocity != 0 {
                    prop_assert_eq!(Some(sample.velocity), values[start as usize + i]);
                }
            }

            // Same input, same output.
            let mut source = video(frames);
            let again = pipeline.run(&mut source, &mut reader).unwrap();
            prop_assert_eq!(again.series.digest(), run.series.digest());
        }
    }
}
