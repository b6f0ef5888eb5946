//! Halftoning algorithms for turning grayscale images into black-and-white
//! or stippled output.
//!
//! Provides threshold, ordered and error-diffusion dithering, stochastic
//! samplers (importance sampling, Bosch-Herman grid dithering) and a Voronoi
//! engine with weighted Lloyd relaxation for stippling. Every algorithm
//! implements the [`Ditherer`] trait so a configured list of them can be run
//! uniformly.

pub mod config;
pub mod diffusion;
pub mod ditherer;
pub mod grid;
pub mod gray;
pub mod importance;
pub mod io;
pub mod ordered;
pub mod pipeline;
pub mod stipple;
pub mod threshold;
pub mod voronoi;

// Re-exports for convenience
pub use config::{DitherConfig, KernelName, MatrixOrder, PipelineConfig, PipelineStep, VoronoiConfig};
pub use diffusion::{DiffusionKernel, DiffusionTap, ErrorDiffusionDitherer};
pub use ditherer::Ditherer;
pub use grid::GridDitherer;
pub use gray::{BLACK, Point, WHITE, invert_gray, make_gray, to_gray};
pub use image::GrayImage;
pub use importance::ImportanceSampling;
pub use io::{load_gray, save_png};
pub use ordered::{OrderedDitherer, Pattern};
pub use pipeline::{Pipeline, PipelineImage, PipelineOutput, seeded_rng};
pub use stipple::StipplingDitherer;
pub use threshold::{RandomThresholdDitherer, ThresholdDitherer};
pub use voronoi::{Region, Tessellation};

/// Errors that can occur while configuring or running a halftoning algorithm.
#[derive(Debug, thiserror::Error)]
pub enum HalftoneError {
    #[error("Invalid threshold: {0} is outside 0..=255")]
    InvalidThreshold(u32),

    #[error("Invalid grid cell size: {0}")]
    InvalidCellSize(u32),

    #[error("Invalid grid parameters: alpha={alpha}, beta={beta}")]
    InvalidGridParameters { alpha: f64, beta: f64 },

    #[error("Invalid roulette weight base: {0}")]
    InvalidWeightBase(u32),

    #[error("Invalid diffusion kernel: {0}")]
    InvalidKernel(String),

    #[error("Requested {requested} samples but only {eligible} points are eligible")]
    TooManySamples { requested: usize, eligible: usize },

    #[error("No eligible points to sample from")]
    NoEligiblePoints,

    #[error("At least one Voronoi site is required")]
    NoSites,

    #[error("Image has no pixels")]
    EmptyImage,

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HalftoneError>;
