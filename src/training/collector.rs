//! Per-digit glyph quotas and training sheet rendering.

use crate::config::ConfigError;
use crate::recognition::Glyph;
use image::{imageops, GrayImage, Luma};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::GlyphError;

/// Glyph collection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlyphConfig {
    /// Samples kept for each digit.
    pub samples_per_digit: u32,
    /// Digits the engine confuses most; these get extra samples.
    pub boosted_digits: Vec<u8>,
    /// Extra samples for each boosted digit.
    pub boost: u32,
    /// Blank rows above each glyph on the sheet.
    pub padding: u32,
    /// Seed for the sheet order.
    pub seed: u64,
}

impl Default for GlyphConfig {
    fn default() -> Self {
        Self {
            samples_per_digit: 10,
            boosted_digits: vec![5, 6],
            boost: 3,
            padding: 10,
            seed: 0,
        }
    }
}

impl GlyphConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.samples_per_digit == 0 {
            return Err(ConfigError::InvalidGlyphQuota);
        }
        if let Some(&digit) = self.boosted_digits.iter().find(|&&d| d > 9) {
            return Err(ConfigError::InvalidDigit(digit));
        }
        Ok(())
    }

    /// Number of samples wanted for `digit`.
    pub fn quota(&self, digit: u8) -> u32 {
        if self.boosted_digits.contains(&digit) {
            self.samples_per_digit + self.boost
        } else {
            self.samples_per_digit
        }
    }

    /// Total samples across all ten digits.
    pub fn total(&self) -> u32 {
        (0..10).map(|d| self.quota(d)).sum()
    }
}

/// Accumulates slot images until every digit has its quota.
#[derive(Debug, Clone)]
pub struct GlyphCollector {
    config: GlyphConfig,
    counts: [u32; 10],
    glyphs: Vec<Glyph>,
    glyph_size: Option<(u32, u32)>,
}

impl GlyphCollector {
    pub fn new(config: GlyphConfig) -> Self {
        Self {
            config,
            counts: [0; 10],
            glyphs: Vec::new(),
            glyph_size: None,
        }
    }

    /// Offers a glyph. Returns true if it was kept.
    ///
    /// Glyphs for digits that already have their quota are dropped. All
    /// kept glyphs must share one size.
    pub fn observe(&mut self, glyph: Glyph) -> Result<bool, GlyphError> {
        let digit = glyph.digit;
        if digit > 9 || self.counts[digit as usize] >= self.config.quota(digit) {
            return Ok(false);
        }

        let size = glyph.image.dimensions();
        match self.glyph_size {
            Some(expected) if expected != size => {
                return Err(GlyphError::SizeMismatch {
                    expected,
                    actual: size,
                })
            }
            _ => self.glyph_size = Some(size),
        }

        self.counts[digit as usize] += 1;
        self.glyphs.push(glyph);
        Ok(true)
    }

    /// True once every digit has reached its quota.
    pub fn is_ready(&self) -> bool {
        (0..10u8).all(|d| self.counts[d as usize] >= self.config.quota(d))
    }

    pub fn collected(&self) -> usize {
        self.glyphs.len()
    }

    pub fn count(&self, digit: u8) -> u32 {
        self.counts.get(digit as usize).copied().unwrap_or(0)
    }

    /// Stacks all glyphs vertically in a seeded random order.
    ///
    /// The sheet is one glyph wide, black, with `padding` rows above
    /// each glyph.
    pub fn render_sheet(&self) -> Result<GrayImage, GlyphError> {
        let (width, height) = match self.glyph_size {
            Some(size) if self.is_ready() => size,
            _ => {
                return Err(GlyphError::Incomplete {
                    collected: self.glyphs.len(),
                    required: self.config.total() as usize,
                })
            }
        };

        let pitch = height + self.config.padding;
        let mut sheet = GrayImage::from_pixel(width, pitch * self.glyphs.len() as u32, Luma([0]));

        for (row, &index) in self.shuffled_order().iter().enumerate() {
            let y = self.config.padding + row as u32 * pitch;
            imageops::replace(&mut sheet, &self.glyphs[index].image, 0, i64::from(y));
        }
        Ok(sheet)
    }

    /// Renders the sheet and writes it to `path`.
    pub fn save_sheet(&self, path: impl AsRef<Path>) -> Result<(), GlyphError> {
        let sheet = self.render_sheet()?;
        sheet.save(path.as_ref())?;
        tracing::info!(
            path = %path.as_ref().display(),
            glyphs = self.glyphs.len(),
            "Training sheet written"
        );
        Ok(())
    }

    /// Glyph indices in sheet order.
    fn shuffled_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.glyphs.len()).collect();
        order.shuffle(&mut ChaCha8Rng::seed_from_u64(self.config.seed));
        order
    }
}
