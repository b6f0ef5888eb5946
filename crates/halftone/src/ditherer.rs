//! The common contract shared by every halftoning algorithm.

use image::GrayImage;
use rand::RngCore;

use crate::Result;

/// Converts a grayscale image (0 = black, 255 = white) into a black-and-white
/// or stippled image of the same dimensions.
///
/// Implementations never modify `gray`. Randomized algorithms draw from `rng`
/// only, so output is reproducible for a seeded source; deterministic ones
/// ignore it.
pub trait Ditherer {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Run the algorithm over `gray` and return a new image.
    fn apply(&self, gray: &GrayImage, rng: &mut dyn RngCore) -> Result<GrayImage>;
}

impl<D: Ditherer + ?Sized> Ditherer for Box<D> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn apply(&self, gray: &GrayImage, rng: &mut dyn RngCore) -> Result<GrayImage> {
        (**self).apply(gray, rng)
    }
}
