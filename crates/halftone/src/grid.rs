//! Bosch and Herman's grid-based stochastic dithering.

use image::{GrayImage, Luma};
use rand::{Rng, RngCore};
use tracing::debug;

use crate::ditherer::Ditherer;
use crate::gray::{BLACK, WHITE, average_intensity, make_gray};
use crate::{HalftoneError, Result};

/// Number of points to paint in a cell of mean normalized intensity `mu`.
///
/// `n = ((1 - mu) * beta)^2 / 3`, floored; cells where `n < alpha` get none.
pub fn sample_count(mu: f64, alpha: f64, beta: f64) -> usize {
    let n = ((1.0 - mu) * beta).powi(2) / 3.0;
    if n < alpha { 0 } else { n.floor() as usize }
}

/// Upper bound on points drawn per pixel of a cell, `beta^2 / 3 <= cap * cell_size^2`.
pub const MAX_POINTS_PER_PIXEL: f64 = 16.0;

/// Splits the image into `cell_size`×`cell_size` cells and scatters random
/// black points in each, more of them in darker cells.
///
/// Points within a cell are drawn independently, so the same pixel may be
/// picked twice. Edge cells are clipped to the image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridDitherer {
    cell_size: u32,
    alpha: f64,
    beta: f64,
}

impl GridDitherer {
    /// `alpha` is the minimum point count for a cell to be drawn at all,
    /// `beta` scales the count for a fully black cell.
    ///
    /// A fully black cell may get at most [`MAX_POINTS_PER_PIXEL`] points per
    /// pixel; a larger `beta` is rejected.
    pub fn new(cell_size: u32, alpha: f64, beta: f64) -> Result<Self> {
        if cell_size == 0 {
            return Err(HalftoneError::InvalidCellSize(cell_size));
        }
        if !alpha.is_finite() || !beta.is_finite() || alpha < 0.0 || beta < 0.0 {
            return Err(HalftoneError::InvalidGridParameters { alpha, beta });
        }
        let area = f64::from(cell_size).powi(2);
        if sample_count(0.0, 0.0, beta) as f64 > MAX_POINTS_PER_PIXEL * area {
            return Err(HalftoneError::InvalidGridParameters { alpha, beta });
        }
        Ok(Self {
            cell_size,
            alpha,
            beta,
        })
    }

    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }
}

impl Ditherer for GridDitherer {
    fn name(&self) -> &str {
        "grid"
    }

    fn apply(&self, gray: &GrayImage, rng: &mut dyn RngCore) -> Result<GrayImage> {
        let (width, height) = gray.dimensions();
        debug!(
            width,
            height,
            cell_size = self.cell_size,
            alpha = self.alpha,
            beta = self.beta,
            "Applying grid dithering"
        );

        let mut dithered = make_gray(width, height, WHITE);
        let k = self.cell_size;

        for y in (0..height).step_by(k as usize) {
            for x in (0..width).step_by(k as usize) {
                let x_end = x.saturating_add(k).min(width);
                let y_end = y.saturating_add(k).min(height);
                let mu = average_intensity(gray, x, y, k, k);
                let n = sample_count(mu, self.alpha, self.beta);

                for _ in 0..n {
                    let xx = rng.gen_range(x..x_end);
                    let yy = rng.gen_range(y..y_end);
                    dithered.put_pixel(xx, yy, Luma([BLACK]));
                }
            }
        }

        Ok(dithered)
    }
}
