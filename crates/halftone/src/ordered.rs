//! Ordered dithering with fixed threshold matrices.
//!
//! The threshold for pixel (x, y) is `matrix[x % order][y % order]`; a pixel
//! is white iff its intensity exceeds that threshold.

use image::GrayImage;
use rand::RngCore;
use tracing::debug;

use crate::Result;
use crate::ditherer::Ditherer;
use crate::threshold::binarize;

/// A square matrix of threshold values, indexed as `rows[x % order][y % order]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pattern {
    rows: &'static [&'static [u8]],
}

impl Pattern {
    pub const ORDER_2: Pattern = Pattern {
        rows: &[&[0, 170], &[255, 85]],
    };

    pub const ORDER_3: Pattern = Pattern {
        rows: &[&[0, 223, 95], &[191, 159, 63], &[127, 31, 255]],
    };

    pub const ORDER_4: Pattern = Pattern {
        rows: &[
            &[0, 136, 34, 170],
            &[204, 68, 238, 102],
            &[51, 187, 17, 153],
            &[255, 119, 221, 85],
        ],
    };

    pub const ORDER_8: Pattern = Pattern {
        rows: &[
            &[0, 194, 48, 242, 12, 206, 60, 255],
            &[129, 64, 178, 113, 141, 76, 190, 125],
            &[32, 226, 16, 210, 44, 238, 28, 222],
            &[161, 97, 145, 80, 174, 109, 157, 93],
            &[8, 202, 56, 250, 4, 198, 52, 246],
            &[137, 72, 186, 121, 133, 68, 182, 117],
            &[40, 234, 24, 218, 36, 230, 20, 214],
            &[170, 105, 153, 89, 165, 101, 149, 85],
        ],
    };

    pub fn order(&self) -> usize {
        self.rows.len()
    }

    /// Threshold applied at pixel (x, y).
    pub fn threshold_at(&self, x: u32, y: u32) -> u8 {
        let order = self.order();
        self.rows[x as usize % order][y as usize % order]
    }
}

/// Ordered dithering over one of the [`Pattern`] presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderedDitherer {
    pattern: Pattern,
}

impl OrderedDitherer {
    pub fn new(pattern: Pattern) -> Self {
        Self { pattern }
    }

    pub fn pattern(&self) -> Pattern {
        self.pattern
    }
}

impl Ditherer for OrderedDitherer {
    fn name(&self) -> &str {
        match self.pattern.order() {
            2 => "ordered_2",
            3 => "ordered_3",
            4 => "ordered_4",
            8 => "ordered_8",
            _ => "ordered",
        }
    }

    fn apply(&self, gray: &GrayImage, _rng: &mut dyn RngCore) -> Result<GrayImage> {
        let (width, height) = gray.dimensions();
        debug!(width, height, order = self.pattern.order(), "Applying ordered dithering");
        Ok(binarize(gray, |x, y| self.pattern.threshold_at(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gray::{is_binary, make_gray};
    use image::Luma;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const PRESETS: [Pattern; 4] = [Pattern::ORDER_2, Pattern::ORDER_3, Pattern::ORDER_4, Pattern::ORDER_8];

    #[test]
    fn test_presets_are_square() {
        for (pattern, order) in PRESETS.iter().zip([2, 3, 4, 8]) {
            assert_eq!(pattern.order(), order);
            assert!(pattern.rows.iter().all(|row| row.len() == order));
        }
    }

    #[test]
    fn test_presets_span_full_range() {
        for pattern in PRESETS {
            let values: Vec<u8> = pattern.rows.iter().flat_map(|r| r.iter().copied()).collect();
            assert_eq!(values.iter().min(), Some(&0));
            assert_eq!(values.iter().max(), Some(&255));
            // Every threshold appears once
            let mut sorted = values.clone();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), values.len());
        }
    }

    #[test]
    fn test_threshold_indexing_wraps() {
        let p = Pattern::ORDER_2;
        assert_eq!(p.threshold_at(0, 0), 0);
        assert_eq!(p.threshold_at(0, 1), 170);
        assert_eq!(p.threshold_at(1, 0), 255);
        assert_eq!(p.threshold_at(1, 1), 85);
        assert_eq!(p.threshold_at(2, 3), 170);
        assert_eq!(Pattern::ORDER_8.threshold_at(15, 7), 85);
        assert_eq!(Pattern::ORDER_3.threshold_at(4, 5), 63);
    }

    #[test]
    fn test_order2_mid_gray_pattern() {
        let img = make_gray(4, 4, 128);
        let mut rng = StdRng::seed_from_u64(0);
        let result = OrderedDitherer::new(Pattern::ORDER_2).apply(&img, &mut rng).unwrap();
        for (x, y, p) in result.enumerate_pixels() {
            let expected = if 128 > Pattern::ORDER_2.threshold_at(x, y) { 255 } else { 0 };
            assert_eq!(p.0[0], expected);
        }
        // 128 > 0 and 128 > 85 only
        assert_eq!(result.get_pixel(0, 0).0[0], 255);
        assert_eq!(result.get_pixel(0, 1).0[0], 0);
        assert_eq!(result.get_pixel(1, 0).0[0], 0);
        assert_eq!(result.get_pixel(1, 1).0[0], 255);
    }

    #[test]
    fn test_order2_idempotent_on_binary_output() {
        let mut img = GrayImage::new(9, 7);
        for (x, y, p) in img.enumerate_pixels_mut() {
            *p = Luma([((x * 31 + y * 17) % 256) as u8]);
        }
        let mut rng = StdRng::seed_from_u64(0);
        let ditherer = OrderedDitherer::new(Pattern::ORDER_2);
        let once = ditherer.apply(&img, &mut rng).unwrap();
        let twice = ditherer.apply(&once, &mut rng).unwrap();
        assert!(is_binary(&once));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_extremes() {
        let mut rng = StdRng::seed_from_u64(0);
        for pattern in PRESETS {
            let ditherer = OrderedDitherer::new(pattern);
            let black = ditherer.apply(&make_gray(8, 8, 0), &mut rng).unwrap();
            assert!(black.pixels().all(|p| p.0[0] == 0));
            // A 255 cell in the matrix turns exactly one white pixel per tile black
            let white = ditherer.apply(&make_gray(8, 8, 255), &mut rng).unwrap();
            let order = pattern.order() as u32;
            let tiles = 8u32.div_ceil(order).pow(2) as usize;
            let blacks = white.pixels().filter(|p| p.0[0] == 0).count();
            assert!(blacks <= tiles);
            assert!(blacks > 0);
        }
    }
}
