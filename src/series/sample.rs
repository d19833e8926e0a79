//! One output row.

use crate::recognition::Reading;

/// Velocity and altitude for one frame.
///
/// Altitude is kept in thousandths of the displayed unit so the series
/// never accumulates floating-point error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TelemetrySample {
    pub velocity: u32,
    pub altitude_milli: u32,
}

impl TelemetrySample {
    /// Zero-filled sample written for frames without a usable reading.
    pub const PADDING: TelemetrySample = TelemetrySample {
        velocity: 0,
        altitude_milli: 0,
    };

    pub fn new(velocity: u32, altitude_milli: u32) -> Self {
        Self {
            velocity,
            altitude_milli,
        }
    }

    /// Builds a sample from a velocity and a decimal altitude reading.
    ///
    /// An unreadable or out-of-range altitude is stored as zero.
    pub fn from_readings(velocity: u32, altitude: Reading<f64>) -> Self {
        let altitude_milli = altitude
            .value()
            .map(|km| (km * 1000.0).round())
            .filter(|milli| (0.0..=u32::MAX as f64).contains(milli))
            .map_or(0, |milli| milli as u32);

        Self::new(velocity, altitude_milli)
    }
}
