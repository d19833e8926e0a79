//! Frame type representing one decoded video image with its position.

use crate::recognition::Region;
use image::RgbImage;

/// A single decoded frame from the video.
///
/// Carries the pixel data together with the frame index it was decoded
/// from, which is what keeps output rows aligned with video time.
#[derive(Clone)]
pub struct Frame {
    /// Decoded RGB pixels.
    image: RgbImage,
    /// Zero-based frame index within the video.
    index: u64,
    /// Presentation time in seconds from the start of the video.
    timestamp: f64,
}

impl Frame {
    /// Creates a new frame with the given parameters.
    pub fn new(image: RgbImage, index: u64, timestamp: f64) -> Self {
        Self {
            image,
            index,
            timestamp,
        }
    }

    /// Creates a black frame, used by synthetic sources.
    pub fn blank(width: u32, height: u32, index: u64, timestamp: f64) -> Self {
        Self::new(RgbImage::new(width, height), index, timestamp)
    }

    /// Returns the decoded image.
    #[inline]
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Returns the frame width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Returns the frame height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Returns the frame index.
    #[inline]
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Returns the presentation timestamp in seconds.
    #[inline]
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Returns true if the region lies entirely inside the frame.
    pub fn contains(&self, region: &Region) -> bool {
        region.fits_within(self.width(), self.height())
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("index", &self.index)
            .field("timestamp", &self.timestamp)
            .finish()
    }
}
