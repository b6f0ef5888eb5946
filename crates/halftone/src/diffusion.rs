//! Error-diffusion dithering parameterized by a diffusion kernel.
//!
//! Pixels are visited top-to-bottom, left-to-right. Each one is quantized to
//! black (<= 127) or white, and the quantization error, divided by the
//! kernel's divisor, is pushed onto not-yet-visited neighbours according to
//! the kernel's taps. Neighbours outside the image are skipped.

use std::borrow::Cow;

use image::{GrayImage, Luma};
use rand::RngCore;
use tracing::debug;

use crate::ditherer::Ditherer;
use crate::gray::{BLACK, WHITE};
use crate::{HalftoneError, Result};

/// Intensities above this value quantize to white.
const MIDPOINT: u8 = 127;

/// One tap of a diffusion kernel: `weight` parts of the error go to (x+dx, y+dy).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffusionTap {
    pub dx: i32,
    pub dy: i32,
    pub weight: i16,
}

const fn tap(dx: i32, dy: i32, weight: i16) -> DiffusionTap {
    DiffusionTap { dx, dy, weight }
}

/// A list of taps and the divisor that normalizes their weights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffusionKernel {
    divisor: i16,
    taps: Cow<'static, [DiffusionTap]>,
}

impl DiffusionKernel {
    /// Right 7, bottom-left 3, bottom 5, bottom-right 1 (/16).
    pub const FLOYD_STEINBERG: DiffusionKernel = DiffusionKernel::preset(
        16,
        &[tap(1, 0, 7), tap(-1, 1, 3), tap(0, 1, 5), tap(1, 1, 1)],
    );

    pub const JARVIS_JUDICE_NINKE: DiffusionKernel = DiffusionKernel::preset(
        48,
        &[
            tap(1, 0, 7),
            tap(2, 0, 5),
            tap(-2, 1, 3),
            tap(-1, 1, 5),
            tap(0, 1, 7),
            tap(1, 1, 5),
            tap(2, 1, 3),
            tap(-2, 2, 1),
            tap(-1, 2, 3),
            tap(0, 2, 5),
            tap(1, 2, 3),
            tap(2, 2, 1),
        ],
    );

    /// The full published 12-tap Stucki table (/42).
    pub const STUCKI: DiffusionKernel = DiffusionKernel::preset(
        42,
        &[
            tap(1, 0, 8),
            tap(2, 0, 4),
            tap(-2, 1, 2),
            tap(-1, 1, 4),
            tap(0, 1, 8),
            tap(1, 1, 4),
            tap(2, 1, 2),
            tap(-2, 2, 1),
            tap(-1, 2, 2),
            tap(0, 2, 4),
            tap(1, 2, 2),
            tap(2, 2, 1),
        ],
    );

    /// Diffuses only 6/8 of the error.
    pub const ATKINSON: DiffusionKernel = DiffusionKernel::preset(
        8,
        &[
            tap(1, 0, 1),
            tap(2, 0, 1),
            tap(-1, 1, 1),
            tap(0, 1, 1),
            tap(1, 1, 1),
            tap(0, 2, 1),
        ],
    );

    pub const BURKES: DiffusionKernel = DiffusionKernel::preset(
        32,
        &[
            tap(1, 0, 8),
            tap(2, 0, 4),
            tap(-2, 1, 2),
            tap(-1, 1, 4),
            tap(0, 1, 8),
            tap(1, 1, 4),
            tap(2, 1, 2),
        ],
    );

    pub const SIERRA: DiffusionKernel = DiffusionKernel::preset(
        32,
        &[
            tap(1, 0, 5),
            tap(2, 0, 3),
            tap(-2, 1, 2),
            tap(-1, 1, 4),
            tap(0, 1, 5),
            tap(1, 1, 4),
            tap(2, 1, 2),
            tap(-1, 2, 2),
            tap(0, 2, 3),
            tap(1, 2, 2),
        ],
    );

    /// Published weights, summing to the divisor.
    pub const TWO_ROW_SIERRA: DiffusionKernel = DiffusionKernel::preset(
        16,
        &[
            tap(1, 0, 4),
            tap(2, 0, 3),
            tap(-2, 1, 1),
            tap(-1, 1, 2),
            tap(0, 1, 3),
            tap(1, 1, 2),
            tap(2, 1, 1),
        ],
    );

    /// Right 2, bottom-left 1, bottom 1 (/4).
    pub const SIERRA_LITE: DiffusionKernel =
        DiffusionKernel::preset(4, &[tap(1, 0, 2), tap(-1, 1, 1), tap(0, 1, 1)]);

    const fn preset(divisor: i16, taps: &'static [DiffusionTap]) -> Self {
        Self {
            divisor,
            taps: Cow::Borrowed(taps),
        }
    }

    /// Build a custom kernel.
    ///
    /// The divisor must be positive, weights non-negative, and every tap must
    /// point at a pixel visited later in the scan (below, or to the right on
    /// the same row).
    pub fn new(divisor: i16, taps: Vec<DiffusionTap>) -> Result<Self> {
        if divisor <= 0 {
            return Err(HalftoneError::InvalidKernel(format!(
                "divisor must be positive, got {divisor}"
            )));
        }
        if taps.is_empty() {
            return Err(HalftoneError::InvalidKernel("kernel has no taps".into()));
        }
        for t in &taps {
            if t.weight < 0 {
                return Err(HalftoneError::InvalidKernel(format!(
                    "negative weight {} at ({}, {})",
                    t.weight, t.dx, t.dy
                )));
            }
            if t.dy < 0 || (t.dy == 0 && t.dx <= 0) {
                return Err(HalftoneError::InvalidKernel(format!(
                    "tap ({}, {}) targets an already processed pixel",
                    t.dx, t.dy
                )));
            }
        }
        Ok(Self {
            divisor,
            taps: Cow::Owned(taps),
        })
    }

    pub fn divisor(&self) -> i16 {
        self.divisor
    }

    pub fn taps(&self) -> &[DiffusionTap] {
        &self.taps
    }

    /// Sum of all tap weights. Divided by the divisor this is the share of
    /// the error that gets diffused.
    pub fn total_weight(&self) -> i32 {
        self.taps.iter().map(|t| i32::from(t.weight)).sum()
    }
}

/// Error-diffusion dithering with a configurable kernel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDiffusionDitherer {
    name: String,
    kernel: DiffusionKernel,
}

impl ErrorDiffusionDitherer {
    pub fn new(name: impl Into<String>, kernel: DiffusionKernel) -> Self {
        Self {
            name: name.into(),
            kernel,
        }
    }

    pub fn floyd_steinberg() -> Self {
        Self::new("floyd_steinberg", DiffusionKernel::FLOYD_STEINBERG)
    }

    pub fn kernel(&self) -> &DiffusionKernel {
        &self.kernel
    }
}

impl Ditherer for ErrorDiffusionDitherer {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, gray: &GrayImage, _rng: &mut dyn RngCore) -> Result<GrayImage> {
        let (width, height) = gray.dimensions();
        debug!(width, height, kernel = %self.name, "Applying error diffusion");

        let mut buffer = gray.clone();
        for y in 0..height {
            for x in 0..width {
                let old_pixel = buffer.get_pixel(x, y).0[0];
                let new_pixel = if old_pixel > MIDPOINT { WHITE } else { BLACK };
                buffer.put_pixel(x, y, Luma([new_pixel]));

                let quant =
                    (i32::from(old_pixel) - i32::from(new_pixel)) / i32::from(self.kernel.divisor);
                if quant != 0 {
                    distribute_error(&mut buffer, x, y, &self.kernel, quant);
                }
            }
        }

        debug!(kernel = %self.name, "Error diffusion complete");
        Ok(buffer)
    }
}

/// Add `weight * quant` to each in-bounds neighbour, clamped to 0..=255.
fn distribute_error(buffer: &mut GrayImage, x: u32, y: u32, kernel: &DiffusionKernel, quant: i32) {
    let (width, height) = buffer.dimensions();

    for t in kernel.taps() {
        let Some(nx) = x.checked_add_signed(t.dx).filter(|&nx| nx < width) else {
            continue;
        };
        let Some(ny) = y.checked_add_signed(t.dy).filter(|&ny| ny < height) else {
            continue;
        };
        let pixel = buffer.get_pixel_mut(nx, ny);
        // |quant| <= 127 and weight <= i16::MAX, so the product fits in i32
        let value = i32::from(pixel.0[0]) + i32::from(t.weight) * quant;
        pixel.0[0] = value.clamp(0, 255) as u8;
    }
}
