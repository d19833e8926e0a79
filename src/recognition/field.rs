//! Whole-field reading.

use super::{Preprocessor, Reading, Recognizer, RecognizeError, Region, Whitelist};
use crate::capture::Frame;

/// A numeric type a telemetry field can be parsed as.
pub trait FieldValue: Sized {
    /// Characters the engine may emit for this field.
    const WHITELIST: Whitelist;

    /// Parses recognized text; `None` if the text is not a clean value.
    fn parse(text: &str) -> Option<Self>;
}

impl FieldValue for u32 {
    const WHITELIST: Whitelist = Whitelist::DIGITS;

    fn parse(text: &str) -> Option<Self> {
        let digits = strip_whitespace(text);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}

impl FieldValue for f64 {
    const WHITELIST: Whitelist = Whitelist::DECIMAL;

    fn parse(text: &str) -> Option<Self> {
        let text = strip_whitespace(text);
        let points = text.chars().filter(|&c| c == '.').count();
        let digits = text.chars().filter(char::is_ascii_digit).count();

        if points > 1 || digits == 0 || digits + points != text.len() {
            return None;
        }
        text.parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Reads a whole field with one recognition call.
///
/// Whole-field recognition can silently drop digits when the overlay is
/// partly occluded; prefer [`super::DigitBoxValidator`] where slot
/// geometry is known.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldReader {
    preprocessor: Preprocessor,
}

impl FieldReader {
    pub fn new(preprocessor: Preprocessor) -> Self {
        Self { preprocessor }
    }

    /// Reads `region` of `frame` as a `T`.
    pub fn read<T, R>(
        &self,
        recognizer: &mut R,
        frame: &Frame,
        region: &Region,
    ) -> Result<Reading<T>, RecognizeError>
    where
        T: FieldValue,
        R: Recognizer + ?Sized,
    {
        let image = self.preprocessor.apply(frame, region);
        let text = recognizer.recognize(&image, &T::WHITELIST)?;
        let reading = Reading::from(T::parse(&text));

        if !reading.is_readable() {
            tracing::trace!(frame = frame.index(), text = %text.trim(), "Field unreadable");
        }
        Ok(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::ScriptedRecognizer;

    fn frame() -> Frame {
        Frame::blank(1280, 720, 7, 0.0)
    }

    #[test]
    fn test_integer_parsing() {
        assert_eq!(<u32 as FieldValue>::parse(" 2450\n"), Some(2450));
        assert_eq!(<u32 as FieldValue>::parse("24 50"), Some(2450));
        assert_eq!(<u32 as FieldValue>::parse("24a0"), None);
        assert_eq!(<u32 as FieldValue>::parse(""), None);
        assert_eq!(<u32 as FieldValue>::parse("99999999999"), None);
    }

    #[test]
    fn test_decimal_parsing() {
        assert_eq!(<f64 as FieldValue>::parse("12.34\n"), Some(12.34));
        assert_eq!(<f64 as FieldValue>::parse("7"), Some(7.0));
        assert_eq!(<f64 as FieldValue>::parse("1.2.3"), None);
        assert_eq!(<f64 as FieldValue>::parse("."), None);
        assert_eq!(<f64 as FieldValue>::parse("-4.0"), None);
    }

    #[test]
    fn test_velocity_read_uses_digit_whitelist() {
        let reader = FieldReader::default();
        let mut engine = ScriptedRecognizer::new(["3021\n"]);

        let reading: Reading<u32> = reader
            .read(&mut engine, &frame(), &Region::new(1041, 142, 72, 20))
            .unwrap();

        assert_eq!(reading, Reading::Value(3021));
        assert_eq!(engine.calls()[0].whitelist, Whitelist::DIGITS);
        assert_eq!((engine.calls()[0].width, engine.calls()[0].height), (144, 40));
    }

    #[test]
    fn test_altitude_read_uses_decimal_whitelist() {
        let reader = FieldReader::default();
        let mut engine = ScriptedRecognizer::new(["0.8"]);

        let reading: Reading<f64> = reader
            .read(&mut engine, &frame(), &Region::new(1178, 140, 72, 20))
            .unwrap();

        assert_eq!(reading, Reading::Value(0.8));
        assert_eq!(engine.calls()[0].whitelist, Whitelist::DECIMAL);
    }

    #[test]
    fn test_garbage_is_unreadable() {
        let reader = FieldReader::default();
        let mut engine = ScriptedRecognizer::new(["~~"]);

        let reading: Reading<u32> = reader
            .read(&mut engine, &frame(), &Region::new(1041, 142, 72, 20))
            .unwrap();

        assert_eq!(reading, Reading::Unreadable);
    }
}
