//! Importance sampling: paint N distinct dark points chosen with a roulette
//! wheel that favours darker intensities.

use image::{GrayImage, Luma};
use rand::{Rng, RngCore};
use tracing::debug;

use crate::ditherer::Ditherer;
use crate::gray::{BLACK, Point, WHITE, make_gray};
use crate::{HalftoneError, Result};

/// Default roulette weight base: intensity `i` weighs `(256 - i)` per point.
pub const DEFAULT_WEIGHT_BASE: u32 = 256;

/// Intensity histogram: the coordinates of every pixel, bucketed by intensity.
#[derive(Debug, Clone)]
pub struct Histogram {
    bins: Vec<Vec<Point>>,
}

impl Histogram {
    /// Bucket every pixel whose intensity is `<= threshold`.
    pub fn build(gray: &GrayImage, threshold: u8) -> Self {
        let mut bins = vec![Vec::new(); usize::from(threshold) + 1];
        for (x, y, p) in gray.enumerate_pixels() {
            let intensity = p.0[0];
            if intensity <= threshold {
                bins[usize::from(intensity)].push(Point::new(x, y));
            }
        }
        Self { bins }
    }

    pub fn bin(&self, intensity: u8) -> &[Point] {
        match self.bins.get(usize::from(intensity)) {
            Some(bin) => bin,
            None => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.bins.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cumulative weights per intensity, used for weighted bin selection.
#[derive(Debug, Clone)]
pub struct RouletteWheel {
    weights: Vec<u64>,
    cumulative: Vec<u64>,
}

impl RouletteWheel {
    pub fn new(weights: Vec<u64>) -> Self {
        let mut wheel = Self {
            cumulative: vec![0; weights.len()],
            weights,
        };
        wheel.rebuild_from(0);
        wheel
    }

    pub fn total(&self) -> u64 {
        self.cumulative.last().copied().unwrap_or(0)
    }

    pub fn cumulative(&self) -> &[u64] {
        &self.cumulative
    }

    /// Change the weight of one bin, returning its previous weight.
    ///
    /// Returns `None` and leaves the wheel untouched when `bin` is out of range.
    pub fn set_weight(&mut self, bin: usize, weight: u64) -> Option<u64> {
        let previous = std::mem::replace(self.weights.get_mut(bin)?, weight);
        self.rebuild_from(bin);
        Some(previous)
    }

    /// Bin owning ticket `ticket` in `1..=total`: the first cumulative entry
    /// `>= ticket`.
    pub fn find(&self, ticket: u64) -> usize {
        self.cumulative.partition_point(|&c| c < ticket)
    }

    /// Draw a bin with probability proportional to its weight.
    ///
    /// Returns `None` when every weight is zero.
    pub fn spin(&self, rng: &mut dyn RngCore) -> Option<usize> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let picked = rng.gen_range(0..total);
        Some(self.find(picked + 1))
    }

    fn rebuild_from(&mut self, start: usize) {
        let mut running = if start == 0 { 0 } else { self.cumulative[start - 1] };
        for i in start..self.weights.len() {
            running += self.weights[i];
            self.cumulative[i] = running;
        }
    }
}

/// Importance sampling over pixels no brighter than `threshold`.
///
/// Intensity `i` is picked with weight `(weight_base - i) * remaining(i)`,
/// where `remaining(i)` counts the not-yet-painted points of that intensity.
/// A bin leaves the wheel once exhausted, so exactly `samples` distinct
/// points are painted black on a white canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportanceSampling {
    samples: usize,
    threshold: u8,
    weight_base: u32,
}

impl ImportanceSampling {
    pub fn new(samples: usize, threshold: u8) -> Self {
        Self {
            samples,
            threshold,
            weight_base: DEFAULT_WEIGHT_BASE,
        }
    }

    /// Builder: set the roulette weight base (typically 255 or 256).
    pub fn with_weight_base(mut self, weight_base: u32) -> Result<Self> {
        if weight_base == 0 {
            return Err(HalftoneError::InvalidWeightBase(weight_base));
        }
        self.weight_base = weight_base;
        Ok(self)
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn weight_base(&self) -> u32 {
        self.weight_base
    }

    fn bin_weight(&self, intensity: usize, count: usize) -> u64 {
        u64::from(self.weight_base.saturating_sub(intensity as u32)) * count as u64
    }

    /// Number of points that can be drawn: those in bins with a positive weight.
    pub fn eligible_points(&self, histogram: &Histogram) -> usize {
        (0..=self.threshold)
            .map(|i| histogram.bin(i))
            .enumerate()
            .filter(|(i, bin)| self.bin_weight(*i, bin.len()) > 0)
            .map(|(_, bin)| bin.len())
            .sum()
    }
}

impl Ditherer for ImportanceSampling {
    fn name(&self) -> &str {
        "importance_sampling"
    }

    fn apply(&self, gray: &GrayImage, rng: &mut dyn RngCore) -> Result<GrayImage> {
        let (width, height) = gray.dimensions();
        debug!(
            width,
            height,
            samples = self.samples,
            threshold = self.threshold,
            weight_base = self.weight_base,
            "Applying importance sampling"
        );

        let mut dithered = make_gray(width, height, WHITE);
        if self.samples == 0 {
            return Ok(dithered);
        }

        let histogram = Histogram::build(gray, self.threshold);
        let eligible = self.eligible_points(&histogram);
        if eligible == 0 {
            return Err(HalftoneError::NoEligiblePoints);
        }
        if self.samples > eligible {
            return Err(HalftoneError::TooManySamples {
                requested: self.samples,
                eligible,
            });
        }

        let mut bins = histogram.bins;
        let mut wheel = RouletteWheel::new(
            bins.iter()
                .enumerate()
                .map(|(i, bin)| self.bin_weight(i, bin.len()))
                .collect(),
        );

        for _ in 0..self.samples {
            let bin = wheel.spin(rng).ok_or(HalftoneError::NoEligiblePoints)?;
            let points = &mut bins[bin];
            let point = points.swap_remove(rng.gen_range(0..points.len()));
            dithered.put_pixel(point.x, point.y, Luma([BLACK]));
            wheel.set_weight(bin, self.bin_weight(bin, points.len()));
        }

        debug!(painted = self.samples, eligible, "Importance sampling complete");
        Ok(dithered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn create_gradient_image(width: u32, height: u32) -> GrayImage {
        let mut img = GrayImage::new(width, height);
        for y in 0..height {
            for x in 0..width {
                img.put_pixel(x, y, Luma([((x + y) * 255 / (width + height - 2)) as u8]));
            }
        }
        img
    }

    fn black_count(img: &GrayImage) -> usize {
        img.pixels().filter(|p| p.0[0] == BLACK).count()
    }

    #[test]
    fn test_histogram_excludes_bright_pixels() {
        let mut img = make_gray(3, 1, 200);
        img.put_pixel(0, 0, Luma([10]));
        img.put_pixel(2, 0, Luma([100]));

        let histogram = Histogram::build(&img, 100);
        assert_eq!(histogram.len(), 2);
        assert_eq!(histogram.bin(10), &[Point::new(0, 0)]);
        assert_eq!(histogram.bin(100), &[Point::new(2, 0)]);
        assert!(histogram.bin(200).is_empty());
    }

    #[test]
    fn test_roulette_wheel_lookup() {
        let wheel = RouletteWheel::new(vec![2, 0, 3]);
        assert_eq!(wheel.cumulative(), &[2, 2, 5]);
        assert_eq!(wheel.total(), 5);
        assert_eq!(wheel.find(1), 0);
        assert_eq!(wheel.find(2), 0);
        // Zero-weight bin 1 is never selected
        assert_eq!(wheel.find(3), 2);
        assert_eq!(wheel.find(5), 2);
    }

    #[test]
    fn test_roulette_wheel_set_weight() {
        let mut wheel = RouletteWheel::new(vec![1, 1, 1]);
        assert_eq!(wheel.set_weight(1, 4), Some(1));
        assert_eq!(wheel.cumulative(), &[1, 5, 6]);
        assert_eq!(wheel.set_weight(0, 0), Some(1));
        assert_eq!(wheel.cumulative(), &[0, 4, 5]);
        assert_eq!(wheel.find(1), 1);
    }

    #[test]
    fn test_roulette_wheel_set_weight_out_of_range() {
        let mut wheel = RouletteWheel::new(vec![1, 2]);
        assert_eq!(wheel.set_weight(2, 7), None);
        assert_eq!(wheel.cumulative(), &[1, 3]);
        assert_eq!(wheel.total(), 3);
    }

    #[test]
    fn test_roulette_wheel_empty_spin() {
        let wheel = RouletteWheel::new(vec![0, 0]);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(wheel.spin(&mut rng), None);
    }

    #[test]
    fn test_roulette_wheel_favours_heavy_bins() {
        let wheel = RouletteWheel::new(vec![9, 1]);
        let mut rng = StdRng::seed_from_u64(5);
        let mut counts = [0usize; 2];
        for _ in 0..10_000 {
            counts[wheel.spin(&mut rng).unwrap()] += 1;
        }
        assert!(counts[0] > counts[1] * 4);
    }

    #[test]
    fn test_paints_exactly_n_points() {
        let img = create_gradient_image(20, 20);
        let mut rng = StdRng::seed_from_u64(11);
        let result = ImportanceSampling::new(50, 128).apply(&img, &mut rng).unwrap();
        assert_eq!(black_count(&result), 50);
        for (x, y, p) in result.enumerate_pixels() {
            if p.0[0] == BLACK {
                assert!(img.get_pixel(x, y).0[0] <= 128);
            }
        }
    }

    #[test]
    fn test_all_eligible_points_painted() {
        let img = create_gradient_image(10, 10);
        let threshold = 100;
        let eligible = img.pixels().filter(|p| p.0[0] <= threshold).count();

        let mut rng = StdRng::seed_from_u64(2);
        let result = ImportanceSampling::new(eligible, threshold)
            .apply(&img, &mut rng)
            .unwrap();

        for (x, y, p) in result.enumerate_pixels() {
            let is_eligible = img.get_pixel(x, y).0[0] <= threshold;
            assert_eq!(p.0[0] == BLACK, is_eligible, "({x}, {y})");
        }
    }

    #[test]
    fn test_too_many_samples_rejected() {
        let img = create_gradient_image(10, 10);
        let mut rng = StdRng::seed_from_u64(0);
        let err = ImportanceSampling::new(1_000, 100).apply(&img, &mut rng).unwrap_err();
        assert!(matches!(err, HalftoneError::TooManySamples { requested: 1_000, .. }));
    }

    #[test]
    fn test_no_eligible_points() {
        let img = make_gray(4, 4, 255);
        let mut rng = StdRng::seed_from_u64(0);
        let err = ImportanceSampling::new(1, 100).apply(&img, &mut rng).unwrap_err();
        assert!(matches!(err, HalftoneError::NoEligiblePoints));
    }

    #[test]
    fn test_zero_samples_gives_white_canvas() {
        let img = make_gray(4, 4, 0);
        let mut rng = StdRng::seed_from_u64(0);
        let result = ImportanceSampling::new(0, 255).apply(&img, &mut rng).unwrap();
        assert!(result.pixels().all(|p| p.0[0] == WHITE));
    }

    #[test]
    fn test_weight_base_255_excludes_white() {
        // With base 255 pure white pixels weigh nothing and cannot be drawn
        let mut img = make_gray(4, 1, 255);
        img.put_pixel(0, 0, Luma([0]));
        let sampler = ImportanceSampling::new(2, 255).with_weight_base(255).unwrap();
        let histogram = Histogram::build(&img, 255);
        assert_eq!(sampler.eligible_points(&histogram), 1);

        let mut rng = StdRng::seed_from_u64(0);
        let err = sampler.apply(&img, &mut rng).unwrap_err();
        assert!(matches!(err, HalftoneError::TooManySamples { requested: 2, eligible: 1 }));

        // Base 256 keeps them eligible
        let sampler = ImportanceSampling::new(4, 255);
        let result = sampler.apply(&img, &mut rng).unwrap();
        assert_eq!(black_count(&result), 4);
    }

    #[test]
    fn test_invalid_weight_base() {
        assert!(matches!(
            ImportanceSampling::new(1, 10).with_weight_base(0),
            Err(HalftoneError::InvalidWeightBase(0))
        ));
    }

    #[test]
    fn test_darker_points_sampled_more_often() {
        // Left half black, right half mid-gray, both eligible
        let mut img = make_gray(20, 10, 200);
        for y in 0..10 {
            for x in 0..10 {
                img.put_pixel(x, y, Luma([0]));
            }
        }
        let mut rng = StdRng::seed_from_u64(9);
        let result = ImportanceSampling::new(40, 200).apply(&img, &mut rng).unwrap();
        let left = (0..10)
            .flat_map(|y| (0..10).map(move |x| (x, y)))
            .filter(|&(x, y)| result.get_pixel(x, y).0[0] == BLACK)
            .count();
        assert_eq!(black_count(&result), 40);
        assert!(left > 40 - left);
    }

    #[test]
    fn test_reproducible_with_seed() {
        let img = create_gradient_image(16, 16);
        let sampler = ImportanceSampling::new(30, 150);
        let a = sampler.apply(&img, &mut StdRng::seed_from_u64(4)).unwrap();
        let b = sampler.apply(&img, &mut StdRng::seed_from_u64(4)).unwrap();
        assert_eq!(a, b);
    }
}
