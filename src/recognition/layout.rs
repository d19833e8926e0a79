//! Overlay geometry.
//!
//! Pixel positions of the telemetry fields for one broadcast overlay
//! layout. Frame regions are in source-frame pixels; digit slots are in
//! the pixels of the preprocessed (upscaled) field image.

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};

/// An axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns true if the rectangle is non-empty and inside `width × height`.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.x.checked_add(self.width).is_some_and(|r| r <= width)
            && self.y.checked_add(self.height).is_some_and(|b| b <= height)
    }
}

/// Fixed character slots of a digit field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotGeometry {
    /// Nominal left column of each slot, left to right.
    pub columns: Vec<u32>,
    /// Pixels each slot extends to the left of its column.
    pub left_margin: u32,
    /// Top row shared by all slots.
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for SlotGeometry {
    fn default() -> Self {
        Self {
            columns: vec![7, 33, 60, 89, 114],
            left_margin: 1,
            top: 3,
            width: 24,
            height: 32,
        }
    }
}

impl SlotGeometry {
    /// Number of digits the field always shows.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Sub-rectangles of each slot, left to right.
    pub fn rects(&self) -> impl Iterator<Item = Region> + '_ {
        self.columns.iter().map(move |&column| {
            Region::new(
                column.saturating_sub(self.left_margin),
                self.top,
                self.width,
                self.height,
            )
        })
    }
}

/// Placement of the velocity and altitude fields on the overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayLayout {
    pub velocity: Region,
    pub altitude: Region,
    pub velocity_slots: SlotGeometry,
}

impl Default for OverlayLayout {
    fn default() -> Self {
        Self {
            velocity: Region::new(1041, 142, 72, 20),
            altitude: Region::new(1178, 140, 72, 20),
            velocity_slots: SlotGeometry::default(),
        }
    }
}

impl OverlayLayout {
    /// Checks the layout against the frame size and preprocessing scale.
    pub fn validate(&self, frame_width: u32, frame_height: u32, scale: u32) -> Result<(), ConfigError> {
        for (name, region) in [("velocity", &self.velocity), ("altitude", &self.altitude)] {
            if !region.fits_within(frame_width, frame_height) {
                return Err(ConfigError::RegionOutOfFrame {
                    field: name,
                    region: *region,
                });
            }
        }

        if self.velocity_slots.is_empty() {
            return Err(ConfigError::NoDigitSlots);
        }

        let scaled_width = self.velocity.width * scale;
        let scaled_height = self.velocity.height * scale;
        for slot in self.velocity_slots.rects() {
            if !slot.fits_within(scaled_width, scaled_height) {
                return Err(ConfigError::SlotOutOfField(slot));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_valid_for_720p() {
        let layout = OverlayLayout::default();
        assert!(layout.validate(1280, 720, 2).is_ok());
    }

    #[test]
    fn test_default_layout_rejected_for_small_frames() {
        let layout = OverlayLayout::default();
        assert!(matches!(
            layout.validate(640, 360, 2),
            Err(ConfigError::RegionOutOfFrame { field: "velocity", .. })
        ));
    }

    #[test]
    fn test_slots_must_fit_scaled_field() {
        let layout = OverlayLayout::default();
        // At scale 1 the 72x20 field cannot hold 32px tall slots.
        assert!(matches!(
            layout.validate(1280, 720, 1),
            Err(ConfigError::SlotOutOfField(_))
        ));
    }

    #[test]
    fn test_slot_rects_apply_margin() {
        let slots = SlotGeometry::default();
        let rects: Vec<Region> = slots.rects().collect();

        assert_eq!(rects.len(), 5);
        assert_eq!(rects[0], Region::new(6, 3, 24, 32));
        assert_eq!(rects[4], Region::new(113, 3, 24, 32));
    }
}
