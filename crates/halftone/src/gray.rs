//! Grayscale pixel buffer helpers shared by every algorithm.

use image::{DynamicImage, GrayImage, Luma};
use serde::{Deserialize, Serialize};

/// Intensity of a black pixel.
pub const BLACK: u8 = 0;

/// Intensity of a white pixel.
pub const WHITE: u8 = 255;

/// A pixel coordinate inside an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    pub fn distance_squared(self, other: Point) -> u64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        (dx * dx + dy * dy) as u64
    }
}

impl From<(u32, u32)> for Point {
    fn from((x, y): (u32, u32)) -> Self {
        Self { x, y }
    }
}

/// Create a grayscale image where every pixel has the given intensity.
pub fn make_gray(width: u32, height: u32, intensity: u8) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([intensity]))
}

/// Convert any decoded image to 8-bit grayscale using luminance.
pub fn to_gray(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Invert intensities so that black becomes white and vice versa.
pub fn invert_gray(gray: &GrayImage) -> GrayImage {
    let mut inverted = gray.clone();
    for pixel in inverted.pixels_mut() {
        pixel.0[0] = WHITE - pixel.0[0];
    }
    inverted
}

/// Mean intensity of the `w`×`h` window at (`x`, `y`), normalized to `0.0..=1.0`.
///
/// The window is clipped to the image bounds. An empty window has mean 1.0
/// (white), so it never attracts samples.
pub fn average_intensity(gray: &GrayImage, x: u32, y: u32, w: u32, h: u32) -> f64 {
    let x_end = x.saturating_add(w).min(gray.width());
    let y_end = y.saturating_add(h).min(gray.height());

    let mut sum = 0u64;
    let mut count = 0u64;
    for yy in y..y_end {
        for xx in x..x_end {
            sum += u64::from(gray.get_pixel(xx, yy).0[0]);
            count += 1;
        }
    }

    if count == 0 {
        return 1.0;
    }
    sum as f64 / (count as f64 * f64::from(WHITE))
}

/// Whether every pixel of the image is pure black or pure white.
pub fn is_binary(gray: &GrayImage) -> bool {
    gray.pixels().all(|p| p.0[0] == BLACK || p.0[0] == WHITE)
}
