//! Strict per-slot digit reading.
//!
//! The velocity field always shows the same number of digits at fixed
//! positions. Each slot is recognized on its own and must yield exactly
//! one digit; a single failed slot fails the whole read. This turns
//! dropped digits under partial occlusion into an explicit
//! `Unreadable` instead of a silently wrong number.

use super::{Preprocessor, Reading, Recognizer, RecognizeError, Region, SlotGeometry, Whitelist};
use crate::capture::Frame;
use image::{imageops, GrayImage};

/// A recognized slot: its digit and the binarized slot image.
#[derive(Debug, Clone)]
pub struct Glyph {
    pub digit: u8,
    pub image: GrayImage,
}

/// Reads a fixed-width digit field slot by slot.
#[derive(Debug, Clone)]
pub struct DigitBoxValidator {
    preprocessor: Preprocessor,
    slots: SlotGeometry,
}

impl DigitBoxValidator {
    pub fn new(preprocessor: Preprocessor, slots: SlotGeometry) -> Self {
        Self {
            preprocessor,
            slots,
        }
    }

    /// Reads the field; `Unreadable` unless every slot is a digit.
    pub fn read_fixed<R>(
        &self,
        recognizer: &mut R,
        frame: &Frame,
        region: &Region,
    ) -> Result<Reading<u32>, RecognizeError>
    where
        R: Recognizer + ?Sized,
    {
        let image = self.preprocessor.apply(frame, region);
        let digits = match self.read_slots(recognizer, &image)? {
            Some(digits) => digits,
            None => {
                tracing::trace!(frame = frame.index(), "Digit slot rejected");
                return Ok(Reading::Unreadable);
            }
        };

        Ok(digits
            .iter()
            .try_fold(0u32, |acc, &d| acc.checked_mul(10)?.checked_add(u32::from(d)))
            .into())
    }

    /// Reads the field and returns each slot's digit and image.
    pub fn read_glyphs<R>(
        &self,
        recognizer: &mut R,
        frame: &Frame,
        region: &Region,
    ) -> Result<Option<Vec<Glyph>>, RecognizeError>
    where
        R: Recognizer + ?Sized,
    {
        let image = self.preprocessor.apply(frame, region);
        let Some(digits) = self.read_slots(recognizer, &image)? else {
            return Ok(None);
        };

        let glyphs = self
            .slots
            .rects()
            .zip(digits)
            .map(|(rect, digit)| Glyph {
                digit,
                image: imageops::crop_imm(&image, rect.x, rect.y, rect.width, rect.height)
                    .to_image(),
            })
            .collect();
        Ok(Some(glyphs))
    }

    fn read_slots<R>(
        &self,
        recognizer: &mut R,
        image: &GrayImage,
    ) -> Result<Option<Vec<u8>>, RecognizeError>
    where
        R: Recognizer + ?Sized,
    {
        let mut digits = Vec::with_capacity(self.slots.len());
        for rect in self.slots.rects() {
            let text = recognizer.recognize_region(image, rect, &Whitelist::DIGITS)?;
            match slot_digit(&text) {
                Some(digit) => digits.push(digit),
                None => return Ok(None),
            }
        }
        Ok(Some(digits))
    }
}

impl Default for DigitBoxValidator {
    fn default() -> Self {
        Self::new(Preprocessor::default(), SlotGeometry::default())
    }
}

/// Accepts exactly one ASCII digit, ignoring surrounding whitespace.
fn slot_digit(text: &str) -> Option<u8> {
    let mut chars = text.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_digit() => Some(c as u8 - b'0'),
        _ => None,
    }
}
