//! Training data for the recognition engine.
//!
//! Collects the binarized digit slots of strict velocity reads after
//! liftoff and stacks them into a single-column image that the engine's
//! training tools can consume. Digits the engine tends to confuse get a
//! larger share of the sheet.

mod collector;

pub use collector::{GlyphCollector, GlyphConfig};

use crate::capture::{FrameSource, SourceError};
use crate::recognition::{OverlayReader, RecognizeError, Recognizer};
use crate::sync::{SyncConfig, SyncError, SyncSearch};
use thiserror::Error;

/// Errors that can occur while collecting glyphs.
#[derive(Debug, Error)]
pub enum GlyphError {
    #[error("glyph collection incomplete: {collected} of {required} glyphs")]
    Incomplete { collected: usize, required: usize },
    #[error("glyph size {actual:?} differs from {expected:?}")]
    SizeMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
    #[error("couldn't locate start of telemetry")]
    TelemetryStartNotFound,
    #[error("failed to write training sheet: {0}")]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Recognize(#[from] RecognizeError),
}

/// Finds liftoff, then gathers glyphs until every quota is met or the
/// video ends.
pub fn collect_glyphs<S, R>(
    source: &mut S,
    reader: &mut OverlayReader<R>,
    sync: &SyncConfig,
    config: &GlyphConfig,
) -> Result<GlyphCollector, GlyphError>
where
    S: FrameSource + ?Sized,
    R: Recognizer,
{
    let lock = SyncSearch::new(sync)
        .find_start(source, reader, &sync.liftoff_predicates())?
        .ok_or(GlyphError::TelemetryStartNotFound)?;
    source.seek(lock.start)?;

    let mut collector = GlyphCollector::new(config.clone());
    while !collector.is_ready() {
        let Some(frame) = source.next_frame()? else {
            break;
        };
        let Some(glyphs) = reader.velocity_glyphs(&frame)? else {
            continue;
        };
        for glyph in glyphs {
            collector.observe(glyph)?;
        }
    }

    tracing::info!(
        collected = collector.collected(),
        ready = collector.is_ready(),
        "Glyph collection finished"
    );
    Ok(collector)
}
