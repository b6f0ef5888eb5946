//! Reading source images and writing results.

use std::path::Path;

use image::{EncodableLayout, GrayImage, ImageBuffer, ImageFormat, Pixel, PixelWithColorType};
use tracing::debug;

use crate::Result;
use crate::gray::to_gray;

/// Decode an image file and convert it to grayscale.
pub fn load_gray(path: impl AsRef<Path>) -> Result<GrayImage> {
    let path = path.as_ref();
    let img = image::open(path)?;
    debug!(
        path = %path.display(),
        width = img.width(),
        height = img.height(),
        "Loaded image"
    );
    Ok(to_gray(&img))
}

/// Encode an image as PNG, creating parent directories as needed.
pub fn save_png<P>(img: &ImageBuffer<P, Vec<P::Subpixel>>, path: impl AsRef<Path>) -> Result<()>
where
    P: Pixel + PixelWithColorType,
    [P::Subpixel]: EncodableLayout,
{
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    img.save_with_format(path, ImageFormat::Png)?;
    debug!(path = %path.display(), width = img.width(), height = img.height(), "Saved PNG");
    Ok(())
}
