//! Frame source abstraction for video decoding.
//!
//! This module provides a trait-based abstraction over video decoding,
//! allowing for both a real decoder and synthetic sources for testing.

use super::Frame;
use thiserror::Error;

/// Errors that can occur during frame source operations.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open video: {0}")]
    OpenFailed(String),
    #[error("failed to decode frame: {0}")]
    DecodeFailed(String),
    #[error("failed to seek to frame {index}: {reason}")]
    SeekFailed { index: u64, reason: String },
}

/// Static properties of an opened video.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    /// Frames per second.
    pub fps: f64,
    /// Total number of frames reported by the container.
    pub frame_count: u64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
}

impl VideoInfo {
    pub fn new(fps: f64, frame_count: u64, width: u32, height: u32) -> Self {
        Self {
            fps,
            frame_count,
            width,
            height,
        }
    }

    /// Converts a duration in seconds to a whole number of frames.
    pub fn frames_for(&self, seconds: f64) -> u64 {
        (self.fps * seconds).round().max(0.0) as u64
    }
}

/// Trait for video frame sources.
///
/// A source owns a read cursor: `position` is the index of the frame the
/// next call to `next_frame` will return.
pub trait FrameSource {
    /// Returns the properties of the opened video.
    fn info(&self) -> VideoInfo;

    /// Decodes the frame at the cursor and advances it.
    ///
    /// Returns `Ok(None)` at end of video.
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError>;

    /// Moves the cursor to the given frame index.
    ///
    /// Seeking past the end is allowed; the next read returns `None`.
    fn seek(&mut self, index: u64) -> Result<(), SourceError>;

    /// Returns the index of the next frame to be read.
    fn position(&self) -> u64;

    /// Moves the cursor to the frame shown at the given time.
    fn seek_time(&mut self, seconds: f64) -> Result<(), SourceError> {
        let index = self.info().frames_for(seconds);
        self.seek(index)
    }
}

/// Moves `cursor` to `index` once the decoder accepts the seek.
///
/// A seek at or past the known end never reaches the decoder, since
/// backends commonly refuse it; the next read returns `None` instead.
/// A decoder that reports the seek as not applied leaves the cursor
/// where it was.
pub(super) fn apply_seek<F>(
    cursor: &mut u64,
    info: &VideoInfo,
    index: u64,
    decoder_seek: F,
) -> Result<(), SourceError>
where
    F: FnOnce() -> Result<bool, String>,
{
    let past_end = info.frame_count > 0 && index >= info.frame_count;
    if !past_end {
        match decoder_seek() {
            Ok(true) => {}
            Ok(false) => {
                return Err(SourceError::SeekFailed {
                    index,
                    reason: "decoder did not apply the seek".to_string(),
                })
            }
            Err(reason) => return Err(SourceError::SeekFailed { index, reason }),
        }
    }

    tracing::trace!(from = *cursor, to = index, past_end, "Seek");
    *cursor = index;
    Ok(())
}

/// Synthetic video for testing that generates blank frames.
///
/// Frame content is irrelevant to the scripted readers used alongside it;
/// only the index and timing matter.
#[derive(Debug)]
pub struct SyntheticVideo {
    info: VideoInfo,
    cursor: u64,
    frames_decoded: u64,
    seekable: bool,
}

impl SyntheticVideo {
    pub fn new(info: VideoInfo) -> Self {
        Self {
            info,
            cursor: 0,
            frames_decoded: 0,
            seekable: true,
        }
    }

    /// Creates a 30 fps video of the given length and resolution.
    pub fn with_length(frame_count: u64, width: u32, height: u32) -> Self {
        Self::new(VideoInfo::new(30.0, frame_count, width, height))
    }

    /// Makes every in-range seek fail, like a stream that cannot seek.
    pub fn refuse_seeks(mut self) -> Self {
        self.seekable = false;
        self
    }

    /// Returns how many frames have been decoded, seeks included.
    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }
}

impl FrameSource for SyntheticVideo {
    fn info(&self) -> VideoInfo {
        self.info
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        if self.cursor >= self.info.frame_count {
            return Ok(None);
        }

        let index = self.cursor;
        let timestamp = index as f64 / self.info.fps;
        self.cursor += 1;
        self.frames_decoded += 1;

        Ok(Some(Frame::blank(
            self.info.width,
            self.info.height,
            index,
            timestamp,
        )))
    }

    fn seek(&mut self, index: u64) -> Result<(), SourceError> {
        let seekable = self.seekable;
        apply_seek(&mut self.cursor, &self.info, index, || Ok(seekable))
    }

    fn position(&self) -> u64 {
        self.cursor
    }
}
