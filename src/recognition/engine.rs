//! Text recognition capability.
//!
//! The engine is treated as an opaque best-guess text source. It never
//! signals "unreadable" itself; callers validate the text it returns.

use super::Region;
use image::{imageops, GrayImage};
use std::collections::VecDeque;
use thiserror::Error;

/// Errors raised by the recognition engine itself.
///
/// Bad or empty text is not an error; these mean the engine is unusable.
#[derive(Debug, Error)]
pub enum RecognizeError {
    #[error("recognition engine unavailable: {0}")]
    Unavailable(String),
    #[error("recognition failed: {0}")]
    Failed(String),
}

/// The set of characters the engine may emit for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Whitelist(&'static str);

impl Whitelist {
    /// Decimal digits only.
    pub const DIGITS: Whitelist = Whitelist("0123456789");
    /// Decimal digits and the decimal point.
    pub const DECIMAL: Whitelist = Whitelist("0123456789.");

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

/// Trait for text recognition engines.
///
/// The whitelist is passed with every call rather than configured on
/// the engine, so no call can observe another call's configuration.
pub trait Recognizer {
    /// Recognizes the text in a preprocessed image.
    fn recognize(&mut self, image: &GrayImage, whitelist: &Whitelist) -> Result<String, RecognizeError>;

    /// Recognizes the text inside one sub-rectangle of the image.
    fn recognize_region(
        &mut self,
        image: &GrayImage,
        rect: Region,
        whitelist: &Whitelist,
    ) -> Result<String, RecognizeError> {
        let crop = imageops::crop_imm(image, rect.x, rect.y, rect.width, rect.height).to_image();
        self.recognize(&crop, whitelist)
    }
}

/// One recorded call to a [`ScriptedRecognizer`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizeCall {
    pub width: u32,
    pub height: u32,
    pub whitelist: Whitelist,
}

/// Mock engine for testing that replays canned responses in order.
///
/// Returns an empty string once the script runs out.
#[derive(Debug, Default)]
pub struct ScriptedRecognizer {
    responses: VecDeque<String>,
    calls: Vec<RecognizeCall>,
}

impl ScriptedRecognizer {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: responses.into_iter().map(Into::into).collect(),
            calls: Vec::new(),
        }
    }

    /// Returns every call made so far.
    pub fn calls(&self) -> &[RecognizeCall] {
        &self.calls
    }

    /// Returns the number of responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.responses.len()
    }
}

impl Recognizer for ScriptedRecognizer {
    fn recognize(&mut self, image: &GrayImage, whitelist: &Whitelist) -> Result<String, RecognizeError> {
        self.calls.push(RecognizeCall {
            width: image.width(),
            height: image.height(),
            whitelist: whitelist.clone(),
        });
        Ok(self.responses.pop_front().unwrap_or_default())
    }
}
