//! Weighted Voronoi stippling: random sites relaxed toward dark areas,
//! drawn as single black dots.

use image::GrayImage;
use rand::RngCore;
use tracing::debug;

use crate::ditherer::Ditherer;
use crate::gray::invert_gray;
use crate::voronoi::{draw_sites, random_sites, relax};
use crate::{HalftoneError, Result};

/// Stippling driven by Lloyd relaxation over darkness weights (`255 - intensity`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StipplingDitherer {
    sites: usize,
    iterations: usize,
}

impl StipplingDitherer {
    pub fn new(sites: usize, iterations: usize) -> Result<Self> {
        if sites == 0 {
            return Err(HalftoneError::NoSites);
        }
        Ok(Self { sites, iterations })
    }

    pub fn sites(&self) -> usize {
        self.sites
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

impl Ditherer for StipplingDitherer {
    fn name(&self) -> &str {
        "stippling"
    }

    fn apply(&self, gray: &GrayImage, rng: &mut dyn RngCore) -> Result<GrayImage> {
        let (width, height) = gray.dimensions();
        debug!(
            width,
            height,
            sites = self.sites,
            iterations = self.iterations,
            "Applying Voronoi stippling"
        );

        let sites = random_sites(self.sites, width, height, rng)?;
        let weights = invert_gray(gray);
        let tessellation = relax(&sites, &weights, self.iterations)?;

        debug!(sites = tessellation.len(), "Voronoi stippling complete");
        Ok(draw_sites(&tessellation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gray::{BLACK, is_binary, make_gray};
    use image::Luma;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_requires_sites() {
        assert!(matches!(StipplingDitherer::new(0, 3), Err(HalftoneError::NoSites)));
    }

    #[test]
    fn test_empty_image_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let err = StipplingDitherer::new(3, 1)
            .unwrap()
            .apply(&GrayImage::new(0, 0), &mut rng)
            .unwrap_err();
        assert!(matches!(err, HalftoneError::EmptyImage));
    }

    #[test]
    fn test_dots_reach_dark_half() {
        let mut img = make_gray(24, 12, 255);
        for y in 0..12 {
            for x in 12..24 {
                img.put_pixel(x, y, Luma([0]));
            }
        }
        let mut rng = StdRng::seed_from_u64(6);
        let result = StipplingDitherer::new(8, 10).unwrap().apply(&img, &mut rng).unwrap();

        assert!(is_binary(&result));
        let dots: Vec<(u32, u32)> = result
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] == BLACK)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!dots.is_empty() && dots.len() <= 8);
        assert!(dots.iter().any(|(x, _)| *x >= 12), "dots: {dots:?}");
    }

    #[test]
    fn test_reproducible_with_seed() {
        let mut img = GrayImage::new(16, 16);
        for (x, y, p) in img.enumerate_pixels_mut() {
            *p = Luma([(x * 16 + y) as u8]);
        }
        let ditherer = StipplingDitherer::new(10, 4).unwrap();
        let a = ditherer.apply(&img, &mut StdRng::seed_from_u64(12)).unwrap();
        let b = ditherer.apply(&img, &mut StdRng::seed_from_u64(12)).unwrap();
        assert_eq!(a, b);
    }
}
