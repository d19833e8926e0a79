//! Field image preprocessing.
//!
//! Crop, upscale, greyscale and binarize a field before recognition.
//! Recognition accuracy depends heavily on the binarization threshold.

use super::Region;
use crate::capture::Frame;
use crate::config::ConfigError;
use image::{imageops, imageops::FilterType, GrayImage};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Recognition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Upscale factor applied to each cropped field.
    pub scale: u32,
    /// Luminance above which a pixel becomes white.
    pub threshold: u8,
    /// Directory holding the engine's trained data.
    pub data_path: Option<PathBuf>,
    /// Trained data name to load.
    pub language: String,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            scale: 2,
            threshold: 130,
            data_path: None,
            language: "eng".to_string(),
        }
    }
}

impl RecognitionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scale == 0 || self.scale > 8 {
            return Err(ConfigError::InvalidScale(self.scale));
        }
        Ok(())
    }

    pub fn preprocessor(&self) -> Preprocessor {
        Preprocessor::new(self.scale, self.threshold)
    }
}

/// Turns a frame region into a binary image ready for recognition.
#[derive(Debug, Clone, Copy)]
pub struct Preprocessor {
    scale: u32,
    threshold: u8,
}

impl Preprocessor {
    pub fn new(scale: u32, threshold: u8) -> Self {
        Self {
            scale: scale.max(1),
            threshold,
        }
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Crops `region` out of the frame and binarizes it.
    pub fn apply(&self, frame: &Frame, region: &Region) -> GrayImage {
        let crop = imageops::crop_imm(frame.image(), region.x, region.y, region.width, region.height)
            .to_image();
        let scaled = imageops::resize(
            &crop,
            crop.width() * self.scale,
            crop.height() * self.scale,
            FilterType::CatmullRom,
        );

        let mut grey = imageops::grayscale(&scaled);
        for pixel in grey.pixels_mut() {
            pixel.0[0] = if pixel.0[0] > self.threshold { 255 } else { 0 };
        }
        grey
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        RecognitionConfig::default().preprocessor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn filled_frame(level: u8) -> Frame {
        let image = RgbImage::from_pixel(64, 32, Rgb([level, level, level]));
        Frame::new(image, 0, 0.0)
    }

    #[test]
    fn test_output_is_scaled_region() {
        let out = Preprocessor::default().apply(&filled_frame(200), &Region::new(4, 4, 20, 10));
        assert_eq!(out.dimensions(), (40, 20));
    }

    #[test]
    fn test_binarizes_around_threshold() {
        let pre = Preprocessor::new(2, 130);
        let region = Region::new(0, 0, 16, 8);

        let bright = pre.apply(&filled_frame(131), &region);
        assert!(bright.pixels().all(|p| p.0[0] == 255));

        let dark = pre.apply(&filled_frame(130), &region);
        assert!(dark.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn test_zero_scale_rejected() {
        let config = RecognitionConfig {
            scale: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidScale(0))));
    }
}
