use crate::error::{FrapError, Result};

/// Converts physical lengths (microns) to pixel coordinates.
///
/// Rounding is half away from zero (`f64::round`) everywhere, so a coordinate
/// exactly half a pixel past a boundary always lands on the outer pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelGeometry {
    microns_per_pixel: f64,
}

impl PixelGeometry {
    pub fn new(microns_per_pixel: f64) -> Result<Self> {
        if !microns_per_pixel.is_finite() || microns_per_pixel <= 0.0 {
            return Err(FrapError::Metadata(format!(
                "pixel size must be a positive number of microns, got {microns_per_pixel}"
            )));
        }
        Ok(Self { microns_per_pixel })
    }

    pub fn microns_per_pixel(&self) -> f64 {
        self.microns_per_pixel
    }

    pub fn to_pixel(&self, microns: f64) -> i64 {
        (microns / self.microns_per_pixel).round() as i64
    }
}
