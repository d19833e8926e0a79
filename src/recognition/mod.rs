//! Turning frames into typed readings.
//!
//! This module crops the telemetry fields out of a frame, prepares them
//! for the text recognition engine and validates what the engine returns.
//! The engine itself is an opaque collaborator behind [`Recognizer`].

mod digit_box;
mod engine;
mod field;
mod layout;
mod preprocess;
mod reader;
mod reading;
#[cfg(feature = "ocr")]
mod tesseract_engine;

pub use digit_box::{DigitBoxValidator, Glyph};
pub use engine::{RecognizeCall, RecognizeError, Recognizer, ScriptedRecognizer, Whitelist};
pub use field::{FieldReader, FieldValue};
pub use layout::{OverlayLayout, Region, SlotGeometry};
pub use preprocess::{Preprocessor, RecognitionConfig};
pub use reader::{OverlayReader, ScriptedReader, TelemetryReader};
pub use reading::Reading;
#[cfg(feature = "ocr")]
pub use tesseract_engine::TesseractEngine;
