//! Telemetry time series.
//!
//! One sample per video frame from telemetry start onward, with
//! zero-filled samples standing in for frames that could not be read.
//! Position in the series is the frame offset from telemetry start.

mod output;
mod sample;

pub use output::{OutputConfig, SeriesError, TimeColumn};
pub use sample::TelemetrySample;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Ordered samples aligned with video frames.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySeries {
    /// Frame rate of the source video.
    fps: f64,
    /// Index of the video frame that sample 0 was read from.
    start_frame: u64,
    samples: Vec<TelemetrySample>,
    padded: u64,
}

impl TelemetrySeries {
    pub fn new(fps: f64, start_frame: u64) -> Self {
        Self {
            fps,
            start_frame,
            samples: Vec::new(),
            padded: 0,
        }
    }

    /// Appends a sample read from the next frame.
    pub fn push(&mut self, sample: TelemetrySample) {
        self.samples.push(sample);
    }

    /// Appends `count` zero-filled samples.
    pub fn pad(&mut self, count: u64) {
        self.samples
            .extend(std::iter::repeat(TelemetrySample::PADDING).take(count as usize));
        self.padded += count;
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[TelemetrySample] {
        &self.samples
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn start_frame(&self) -> u64 {
        self.start_frame
    }

    /// Video frame index the next sample will correspond to.
    pub fn next_frame(&self) -> u64 {
        self.start_frame + self.samples.len() as u64
    }

    /// Number of samples written as padding.
    pub fn padded(&self) -> u64 {
        self.padded
    }

    /// Seconds between telemetry start and sample `index`.
    pub fn elapsed(&self, index: usize) -> f64 {
        index as f64 / self.fps
    }

    /// Writes one `time,velocity,altitude` row per sample, no header.
    pub fn write_rows<W: Write>(&self, out: W, time: TimeColumn) -> Result<(), SeriesError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(out);

        for (index, sample) in self.samples.iter().enumerate() {
            let time = match time {
                TimeColumn::Seconds => format!("{:.3}", self.elapsed(index)),
                TimeColumn::Frame => index.to_string(),
            };
            writer.write_record([
                time,
                sample.velocity.to_string(),
                sample.altitude_milli.to_string(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Writes the rows to a file, replacing it.
    pub fn save(&self, path: impl AsRef<Path>, time: TimeColumn) -> Result<(), SeriesError> {
        let file = File::create(path.as_ref())?;
        self.write_rows(BufWriter::new(file), time)?;
        tracing::info!(path = %path.as_ref().display(), rows = self.len(), "Series written");
        Ok(())
    }

    /// BLAKE3 digest of the sample values, as hex.
    ///
    /// Two runs over the same video with a deterministic engine produce
    /// the same digest.
    pub fn digest(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.start_frame.to_le_bytes());
        for sample in &self.samples {
            hasher.update(&sample.velocity.to_le_bytes());
            hasher.update(&sample.altitude_milli.to_le_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series() -> TelemetrySeries {
        let mut series = TelemetrySeries::new(30.0, 1200);
        series.push(TelemetrySample::new(0, 0));
        series.push(TelemetrySample::new(1, 0));
        series.pad(2);
        series.push(TelemetrySample::new(35, 120));
        series
    }

    #[test]
    fn test_padding_keeps_frame_alignment() {
        let series = series();

        assert_eq!(series.len(), 5);
        assert_eq!(series.padded(), 2);
        assert_eq!(series.next_frame(), 1205);
        assert_eq!(series.samples()[2], TelemetrySample::PADDING);
    }

    #[test]
    fn test_rows_in_seconds() {
        let mut out = Vec::new();
        series().write_rows(&mut out, TimeColumn::Seconds).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "0.000,0,0");
        assert_eq!(lines[1], "0.033,1,0");
        assert_eq!(lines[4], "0.133,35,120");
    }

    #[test]
    fn test_rows_by_frame() {
        let mut out = Vec::new();
        series().write_rows(&mut out, TimeColumn::Frame).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("0,0,0\n1,1,0\n2,0,0\n"));
    }

    #[test]
    fn test_rows_read_back_as_csv() {
        let mut out = Vec::new();
        series().write_rows(&mut out, TimeColumn::Frame).unwrap();

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(out.as_slice());
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();

        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|row| row.len() == 3));
        assert_eq!(&rows[4][0], "4");
        assert_eq!(&rows[4][1], "35");
        assert_eq!(&rows[4][2], "120");
    }

    #[test]
    fn test_digest_tracks_content() {
        let a = series();
        let b = series();
        let mut c = series();
        c.push(TelemetrySample::new(36, 130));

        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), c.digest());
    }
}
