//! Voronoi tessellation and weighted Lloyd relaxation.
//!
//! A [`Tessellation`] assigns every pixel of a `width`×`height` area to its
//! nearest site (squared Euclidean distance, ties going to the site listed
//! first). Relaxation repeatedly moves each site to the weighted centroid of
//! its region and re-partitions, for a fixed number of iterations.

use std::collections::HashSet;

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;
use rand::{Rng, RngCore};
use tracing::{debug, warn};

use crate::gray::{BLACK, Point, WHITE, make_gray};
use crate::{HalftoneError, Result};

/// Radius of the marker drawn on each site by [`draw_regions`].
const SITE_MARKER_RADIUS: i32 = 1;

/// A site and the pixels closest to it, in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub site: Point,
    pub points: Vec<Point>,
}

/// A partition of a rectangular area into regions, one per unique site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tessellation {
    width: u32,
    height: u32,
    regions: Vec<Region>,
}

impl Tessellation {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Regions in site order.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn sites(&self) -> Vec<Point> {
        self.regions.iter().map(|r| r.site).collect()
    }

    /// Points assigned to `site`, if it is one of the sites.
    pub fn region(&self, site: Point) -> Option<&[Point]> {
        self.regions
            .iter()
            .find(|r| r.site == site)
            .map(|r| r.points.as_slice())
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Total number of pixels across all regions.
    pub fn point_count(&self) -> usize {
        self.regions.iter().map(|r| r.points.len()).sum()
    }
}

/// Draw `n` sites uniformly at random inside the area. Duplicates are possible.
pub fn random_sites(n: usize, width: u32, height: u32, rng: &mut dyn RngCore) -> Result<Vec<Point>> {
    if width == 0 || height == 0 {
        return Err(HalftoneError::EmptyImage);
    }
    Ok((0..n)
        .map(|_| Point::new(rng.gen_range(0..width), rng.gen_range(0..height)))
        .collect())
}

/// Assign every pixel of the area to its nearest site.
///
/// Repeated sites collapse into the first occurrence, so the result may have
/// fewer regions than `sites` has entries.
pub fn build_voronoi(sites: &[Point], width: u32, height: u32) -> Result<Tessellation> {
    let mut seen = HashSet::with_capacity(sites.len());
    let unique: Vec<Point> = sites.iter().copied().filter(|s| seen.insert(*s)).collect();
    if unique.is_empty() {
        return Err(HalftoneError::NoSites);
    }

    let mut regions: Vec<Region> = unique
        .iter()
        .map(|&site| Region {
            site,
            points: Vec::new(),
        })
        .collect();

    for y in 0..height {
        for x in 0..width {
            let point = Point::new(x, y);
            let closest = closest_site(point, &unique);
            regions[closest].points.push(point);
        }
    }

    debug!(width, height, sites = regions.len(), "Built Voronoi tessellation");
    Ok(Tessellation {
        width,
        height,
        regions,
    })
}

/// Index of the site nearest to `point`; the earliest site wins ties.
fn closest_site(point: Point, sites: &[Point]) -> usize {
    let mut best = 0;
    let mut best_dist = u64::MAX;
    for (i, &site) in sites.iter().enumerate() {
        let dist = point.distance_squared(site);
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best
}

/// Weighted centroid of `points`, rounded half-up.
///
/// Points outside `weights` count with zero weight. Returns `None` when the
/// total weight is zero.
pub fn weighted_centroid(points: &[Point], weights: &GrayImage) -> Option<Point> {
    let mut sum_x = 0u64;
    let mut sum_y = 0u64;
    let mut total = 0u64;
    for p in points {
        let Some(pixel) = weights.get_pixel_checked(p.x, p.y) else {
            continue;
        };
        let w = u64::from(pixel.0[0]);
        sum_x += u64::from(p.x) * w;
        sum_y += u64::from(p.y) * w;
        total += w;
    }
    if total == 0 {
        return None;
    }
    let round = |sum: u64| ((2 * sum + total) / (2 * total)) as u32;
    Some(Point::new(round(sum_x), round(sum_y)))
}

/// Weighted centroid of every region, in region order.
///
/// Weights are read as-is from `weights`; pass an inverted image to pull
/// sites toward dark areas. A region with zero total weight keeps its site.
pub fn calculate_centroids(tessellation: &Tessellation, weights: &GrayImage) -> Vec<Point> {
    tessellation
        .regions
        .iter()
        .map(|region| {
            weighted_centroid(&region.points, weights).unwrap_or_else(|| {
                warn!(
                    x = region.site.x,
                    y = region.site.y,
                    points = region.points.len(),
                    "Region has zero total weight, keeping its site"
                );
                region.site
            })
        })
        .collect()
}

/// One Lloyd step: move sites to their centroids and re-partition.
pub fn center_voronoi(tessellation: &Tessellation, weights: &GrayImage) -> Result<Tessellation> {
    let centroids = calculate_centroids(tessellation, weights);
    build_voronoi(&centroids, tessellation.width, tessellation.height)
}

/// Build a tessellation from `sites` over the bounds of `weights` and run
/// `iterations` Lloyd steps.
pub fn relax(sites: &[Point], weights: &GrayImage, iterations: usize) -> Result<Tessellation> {
    let (width, height) = weights.dimensions();
    let mut tessellation = build_voronoi(sites, width, height)?;
    for i in 0..iterations {
        tessellation = center_voronoi(&tessellation, weights)?;
        debug!(iteration = i + 1, sites = tessellation.len(), "Lloyd relaxation step");
    }
    Ok(tessellation)
}

/// Paint each region a distinct random color, optionally marking sites in black.
pub fn draw_regions(tessellation: &Tessellation, mark_sites: bool, rng: &mut dyn RngCore) -> RgbImage {
    let mut img = RgbImage::new(tessellation.width, tessellation.height);
    let mut used = HashSet::with_capacity(tessellation.regions.len());
    for region in &tessellation.regions {
        let color = loop {
            let rgb = [
                rng.gen_range(0..=u8::MAX),
                rng.gen_range(0..=u8::MAX),
                rng.gen_range(0..=u8::MAX),
            ];
            // Once all 2^24 colors are taken, repeats are unavoidable
            if used.insert(rgb) || used.len() >= 1 << 24 {
                break Rgb(rgb);
            }
        };
        for p in &region.points {
            img.put_pixel(p.x, p.y, color);
        }
    }
    if mark_sites {
        for region in &tessellation.regions {
            let center = (region.site.x as i32, region.site.y as i32);
            draw_filled_circle_mut(&mut img, center, SITE_MARKER_RADIUS, Rgb([0, 0, 0]));
        }
    }
    img
}

/// Paint only the sites, black on a white canvas.
pub fn draw_sites(tessellation: &Tessellation) -> GrayImage {
    let mut img = make_gray(tessellation.width, tessellation.height, WHITE);
    for region in &tessellation.regions {
        if let Some(pixel) = img.get_pixel_mut_checked(region.site.x, region.site.y) {
            *pixel = Luma([BLACK]);
        }
    }
    img
}

#[cfg(test)]
#[path = "voronoi_tests.rs"]
mod tests;
