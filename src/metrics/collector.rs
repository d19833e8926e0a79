//! Metrics collection and registry.

use crate::pipeline::TelemetryRun;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of run state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Frames read in steady state.
    pub frames_processed: u64,
    /// Steady-state frames whose velocity was unreadable.
    pub read_failures: u64,
    /// Successful resyncs.
    pub recoveries: u64,
    /// Zero samples in the series.
    pub padded_frames: u64,
    /// Samples in the series.
    pub series_length: u64,
    /// Video frame index of telemetry start.
    pub telemetry_start: u64,
    /// Last successfully read velocity.
    pub last_velocity: u32,
    /// Whether the run lost lock before the end of the video.
    pub lock_lost: bool,
}

impl MetricsSnapshot {
    /// Creates a snapshot from a finished run.
    pub fn from_run(run: &TelemetryRun) -> Self {
        Self {
            frames_processed: run.stats.frames_read,
            read_failures: run.stats.read_failures,
            recoveries: run.stats.recoveries.len() as u64,
            padded_frames: run.series.padded(),
            series_length: run.series.len() as u64,
            telemetry_start: run.stats.telemetry_start,
            last_velocity: run.stats.last_velocity,
            lock_lost: matches!(run.end, crate::pipeline::RunEnd::LockLost { .. }),
        }
    }
}

/// Prometheus metrics registry for telemetry runs.
pub struct MetricsRegistry {
    registry: Registry,

    // Frame counters
    frames_processed: IntCounter,
    read_failures: IntCounter,
    recoveries: IntCounter,
    padded_frames: IntCounter,

    // Series state
    series_length: IntGauge,
    telemetry_start: IntGauge,
    last_velocity: IntGauge,
    lock_lost: IntGauge,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all run metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let frames_processed = IntCounter::new(
            "launch_telemetry_frames_processed_total",
            "Frames read after telemetry start",
        )?;
        let read_failures = IntCounter::new(
            "launch_telemetry_read_failures_total",
            "Frames whose velocity could not be read",
        )?;
        let recoveries = IntCounter::new(
            "launch_telemetry_recoveries_total",
            "Successful resynchronizations after lost velocity",
        )?;
        let padded_frames = IntCounter::new(
            "launch_telemetry_padded_frames_total",
            "Zero-filled samples written to the series",
        )?;

        let series_length = IntGauge::new(
            "launch_telemetry_series_length",
            "Number of samples in the series",
        )?;
        let telemetry_start = IntGauge::new(
            "launch_telemetry_start_frame",
            "Video frame index of telemetry start",
        )?;
        let last_velocity = IntGauge::new(
            "launch_telemetry_last_velocity",
            "Last velocity read from the overlay",
        )?;
        let lock_lost = IntGauge::new(
            "launch_telemetry_lock_lost",
            "Whether the run ended without regaining lock (1=lost, 0=ok)",
        )?;

        registry.register(Box::new(frames_processed.clone()))?;
        registry.register(Box::new(read_failures.clone()))?;
        registry.register(Box::new(recoveries.clone()))?;
        registry.register(Box::new(padded_frames.clone()))?;
        registry.register(Box::new(series_length.clone()))?;
        registry.register(Box::new(telemetry_start.clone()))?;
        registry.register(Box::new(last_velocity.clone()))?;
        registry.register(Box::new(lock_lost.clone()))?;

        Ok(Self {
            registry,
            frames_processed,
            read_failures,
            recoveries,
            padded_frames,
            series_length,
            telemetry_start,
            last_velocity,
            lock_lost,
        })
    }

    /// Updates all metrics from a snapshot.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        // Counters only move forward by the difference.
        advance(&self.frames_processed, snapshot.frames_processed);
        advance(&self.read_failures, snapshot.read_failures);
        advance(&self.recoveries, snapshot.recoveries);
        advance(&self.padded_frames, snapshot.padded_frames);

        self.series_length.set(snapshot.series_length as i64);
        self.telemetry_start.set(snapshot.telemetry_start as i64);
        self.last_velocity.set(i64::from(snapshot.last_velocity));
        self.lock_lost.set(i64::from(snapshot.lock_lost));
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}
