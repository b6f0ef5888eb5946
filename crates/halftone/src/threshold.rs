//! Threshold and random-threshold binarization.

use image::{GrayImage, Luma};
use rand::{Rng, RngCore};
use tracing::debug;

use crate::ditherer::Ditherer;
use crate::gray::{BLACK, WHITE};
use crate::{HalftoneError, Result};

/// Default threshold value for binarization.
pub const DEFAULT_THRESHOLD: u8 = 127;

/// Fixed-threshold conversion.
///
/// Pixels strictly brighter than `threshold` become white (255), others black (0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdDitherer {
    pub threshold: u8,
}

impl Default for ThresholdDitherer {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl ThresholdDitherer {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }
}

impl Ditherer for ThresholdDitherer {
    fn name(&self) -> &str {
        "threshold"
    }

    fn apply(&self, gray: &GrayImage, _rng: &mut dyn RngCore) -> Result<GrayImage> {
        let (width, height) = gray.dimensions();
        debug!(width, height, threshold = self.threshold, "Applying threshold conversion");
        Ok(binarize(gray, |_, _| self.threshold))
    }
}

/// Threshold conversion where each pixel gets its own threshold, drawn
/// uniformly from `0..=max_threshold` (upper bound inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomThresholdDitherer {
    max_threshold: u8,
}

impl RandomThresholdDitherer {
    /// Fails with [`HalftoneError::InvalidThreshold`] when `max_threshold > 255`.
    pub fn new(max_threshold: u32) -> Result<Self> {
        let max_threshold =
            u8::try_from(max_threshold).map_err(|_| HalftoneError::InvalidThreshold(max_threshold))?;
        Ok(Self { max_threshold })
    }

    pub fn max_threshold(&self) -> u8 {
        self.max_threshold
    }
}

impl Ditherer for RandomThresholdDitherer {
    fn name(&self) -> &str {
        "random_threshold"
    }

    fn apply(&self, gray: &GrayImage, rng: &mut dyn RngCore) -> Result<GrayImage> {
        let (width, height) = gray.dimensions();
        debug!(
            width,
            height,
            max_threshold = self.max_threshold,
            "Applying random threshold conversion"
        );
        Ok(binarize(gray, |_, _| rng.gen_range(0..=self.max_threshold)))
    }
}

/// Binarize `gray` in row-major order against a per-pixel threshold.
pub(crate) fn binarize(gray: &GrayImage, mut threshold_at: impl FnMut(u32, u32) -> u8) -> GrayImage {
    let (width, height) = gray.dimensions();
    let mut output = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let val = gray.get_pixel(x, y).0[0];
            let new_val = if val > threshold_at(x, y) { WHITE } else { BLACK };
            output.put_pixel(x, y, Luma([new_val]));
        }
    }
    output
}
