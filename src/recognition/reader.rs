//! Per-frame telemetry reading.

use super::{
    DigitBoxValidator, FieldReader, Glyph, OverlayLayout, Reading, RecognitionConfig, Recognizer,
    RecognizeError,
};
use crate::capture::Frame;
use std::collections::HashMap;

/// Trait for reading the telemetry fields of one frame.
///
/// This is the seam between frame synchronization and recognition:
/// the pipeline only ever asks for typed readings.
pub trait TelemetryReader {
    /// Strict velocity read used in steady state and confirmation.
    fn velocity(&mut self, frame: &Frame) -> Result<Reading<u32>, RecognizeError>;

    /// Lenient velocity read used while scanning for the overlay.
    fn scan_velocity(&mut self, frame: &Frame) -> Result<Reading<u32>, RecognizeError> {
        self.velocity(frame)
    }

    /// Altitude in display units.
    fn altitude(&mut self, frame: &Frame) -> Result<Reading<f64>, RecognizeError>;
}

/// Reads the broadcast overlay with a recognition engine.
pub struct OverlayReader<R> {
    recognizer: R,
    layout: OverlayLayout,
    field: FieldReader,
    digits: DigitBoxValidator,
}

impl<R: Recognizer> OverlayReader<R> {
    pub fn new(recognizer: R, layout: OverlayLayout, config: &RecognitionConfig) -> Self {
        let preprocessor = config.preprocessor();
        Self {
            recognizer,
            field: FieldReader::new(preprocessor),
            digits: DigitBoxValidator::new(preprocessor, layout.velocity_slots.clone()),
            layout,
        }
    }

    /// Strict velocity read that also returns the slot images.
    pub fn velocity_glyphs(&mut self, frame: &Frame) -> Result<Option<Vec<Glyph>>, RecognizeError> {
        self.digits
            .read_glyphs(&mut self.recognizer, frame, &self.layout.velocity)
    }

    pub fn into_inner(self) -> R {
        self.recognizer
    }
}

impl<R: Recognizer> TelemetryReader for OverlayReader<R> {
    fn velocity(&mut self, frame: &Frame) -> Result<Reading<u32>, RecognizeError> {
        self.digits
            .read_fixed(&mut self.recognizer, frame, &self.layout.velocity)
    }

    fn scan_velocity(&mut self, frame: &Frame) -> Result<Reading<u32>, RecognizeError> {
        let strict = self.velocity(frame)?;
        if strict.is_readable() {
            return Ok(strict);
        }
        // Slot geometry may not line up yet; fall back to the whole field.
        self.field
            .read(&mut self.recognizer, frame, &self.layout.velocity)
    }

    fn altitude(&mut self, frame: &Frame) -> Result<Reading<f64>, RecognizeError> {
        self.field
            .read(&mut self.recognizer, frame, &self.layout.altitude)
    }
}

/// Mock reader for testing that reports scripted values per frame index.
///
/// Frames without a scripted value are unreadable.
#[derive(Debug, Default, Clone)]
pub struct ScriptedReader {
    velocities: HashMap<u64, u32>,
    scan_only: HashMap<u64, u32>,
    altitudes: HashMap<u64, f64>,
    velocity_reads: u64,
}

impl ScriptedReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts velocities for consecutive frames starting at `start`.
    pub fn with_velocities(mut self, start: u64, values: &[Option<u32>]) -> Self {
        for (index, value) in (start..).zip(values) {
            match value {
                Some(v) => {
                    self.velocities.insert(index, *v);
                }
                None => {
                    self.velocities.remove(&index);
                }
            }
        }
        self
    }

    /// Scripts altitudes for consecutive frames starting at `start`.
    pub fn with_altitudes(mut self, start: u64, values: &[f64]) -> Self {
        for (index, value) in (start..).zip(values) {
            self.altitudes.insert(index, *value);
        }
        self
    }

    /// Makes a frame readable only by the lenient scan read.
    pub fn with_scan_only(mut self, index: u64, value: u32) -> Self {
        self.scan_only.insert(index, value);
        self
    }

    /// Number of velocity reads performed, scan reads included.
    pub fn velocity_reads(&self) -> u64 {
        self.velocity_reads
    }
}

impl TelemetryReader for ScriptedReader {
    fn velocity(&mut self, frame: &Frame) -> Result<Reading<u32>, RecognizeError> {
        self.velocity_reads += 1;
        Ok(self.velocities.get(&frame.index()).copied().into())
    }

    fn scan_velocity(&mut self, frame: &Frame) -> Result<Reading<u32>, RecognizeError> {
        let strict = self.velocity(frame)?;
        Ok(strict.or_else(|| self.scan_only.get(&frame.index()).copied().into()))
    }

    fn altitude(&mut self, frame: &Frame) -> Result<Reading<f64>, RecognizeError> {
        Ok(self.altitudes.get(&frame.index()).copied().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::ScriptedRecognizer;

    fn reader(responses: &[&str]) -> OverlayReader<ScriptedRecognizer> {
        OverlayReader::new(
            ScriptedRecognizer::new(responses.iter().copied()),
            OverlayLayout::default(),
            &RecognitionConfig::default(),
        )
    }

    #[test]
    fn test_scan_falls_back_to_whole_field() {
        // First slot fails, whole-field read succeeds.
        let mut reader = reader(&["x", "1520"]);
        let frame = Frame::blank(1280, 720, 0, 0.0);

        assert_eq!(reader.scan_velocity(&frame).unwrap(), Reading::Value(1520));
    }

    #[test]
    fn test_strict_read_has_no_fallback() {
        let mut reader = reader(&["x", "1520"]);
        let frame = Frame::blank(1280, 720, 0, 0.0);

        assert_eq!(reader.velocity(&frame).unwrap(), Reading::Unreadable);
        assert_eq!(reader.into_inner().remaining(), 1);
    }

    #[test]
    fn test_altitude_reads_altitude_region() {
        let mut reader = reader(&["31.5"]);
        let frame = Frame::blank(1280, 720, 0, 0.0);

        assert_eq!(reader.altitude(&frame).unwrap(), Reading::Value(31.5));
    }

    #[test]
    fn test_scripted_reader_by_index() {
        let mut reader = ScriptedReader::new()
            .with_velocities(10, &[Some(0), None, Some(1)])
            .with_scan_only(11, 4);

        let at = |i| Frame::blank(8, 8, i, 0.0);
        assert_eq!(reader.velocity(&at(10)).unwrap(), Reading::Value(0));
        assert_eq!(reader.velocity(&at(11)).unwrap(), Reading::Unreadable);
        assert_eq!(reader.scan_velocity(&at(11)).unwrap(), Reading::Value(4));
        assert_eq!(reader.velocity(&at(12)).unwrap(), Reading::Value(1));
        assert_eq!(reader.velocity_reads(), 4);
    }
}
