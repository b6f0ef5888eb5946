//! Serializable algorithm and pipeline configuration.
//!
//! A [`PipelineConfig`] is a JSON document naming an input image, a list of
//! algorithm steps and an optional Voronoi rendering pass, e.g.
//!
//! ```json
//! {
//!   "input": "penguin.png",
//!   "output_dir": "out",
//!   "seed": 42,
//!   "steps": [
//!     { "output": "fs.png", "algorithm": "error_diffusion", "kernel": "floyd_steinberg" },
//!     { "output": "grid.png", "algorithm": "grid", "cell_size": 5, "alpha": 3.0, "beta": 8.0 }
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::diffusion::{DiffusionKernel, ErrorDiffusionDitherer};
use crate::ditherer::Ditherer;
use crate::grid::GridDitherer;
use crate::importance::{DEFAULT_WEIGHT_BASE, ImportanceSampling};
use crate::ordered::{OrderedDitherer, Pattern};
use crate::stipple::StipplingDitherer;
use crate::threshold::{DEFAULT_THRESHOLD, RandomThresholdDitherer, ThresholdDitherer};

/// Named error-diffusion kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelName {
    FloydSteinberg,
    JarvisJudiceNinke,
    Stucki,
    Atkinson,
    Burkes,
    Sierra,
    TwoRowSierra,
    SierraLite,
}

impl KernelName {
    pub const ALL: [KernelName; 8] = [
        KernelName::FloydSteinberg,
        KernelName::JarvisJudiceNinke,
        KernelName::Stucki,
        KernelName::Atkinson,
        KernelName::Burkes,
        KernelName::Sierra,
        KernelName::TwoRowSierra,
        KernelName::SierraLite,
    ];

    pub fn kernel(self) -> DiffusionKernel {
        match self {
            KernelName::FloydSteinberg => DiffusionKernel::FLOYD_STEINBERG,
            KernelName::JarvisJudiceNinke => DiffusionKernel::JARVIS_JUDICE_NINKE,
            KernelName::Stucki => DiffusionKernel::STUCKI,
            KernelName::Atkinson => DiffusionKernel::ATKINSON,
            KernelName::Burkes => DiffusionKernel::BURKES,
            KernelName::Sierra => DiffusionKernel::SIERRA,
            KernelName::TwoRowSierra => DiffusionKernel::TWO_ROW_SIERRA,
            KernelName::SierraLite => DiffusionKernel::SIERRA_LITE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            KernelName::FloydSteinberg => "floyd_steinberg",
            KernelName::JarvisJudiceNinke => "jarvis_judice_ninke",
            KernelName::Stucki => "stucki",
            KernelName::Atkinson => "atkinson",
            KernelName::Burkes => "burkes",
            KernelName::Sierra => "sierra",
            KernelName::TwoRowSierra => "two_row_sierra",
            KernelName::SierraLite => "sierra_lite",
        }
    }
}

/// Ordered dithering matrix sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum MatrixOrder {
    Two,
    Three,
    Four,
    Eight,
}

impl MatrixOrder {
    pub fn pattern(self) -> Pattern {
        match self {
            MatrixOrder::Two => Pattern::ORDER_2,
            MatrixOrder::Three => Pattern::ORDER_3,
            MatrixOrder::Four => Pattern::ORDER_4,
            MatrixOrder::Eight => Pattern::ORDER_8,
        }
    }
}

impl TryFrom<u8> for MatrixOrder {
    type Error = String;

    fn try_from(order: u8) -> std::result::Result<Self, Self::Error> {
        match order {
            2 => Ok(MatrixOrder::Two),
            3 => Ok(MatrixOrder::Three),
            4 => Ok(MatrixOrder::Four),
            8 => Ok(MatrixOrder::Eight),
            other => Err(format!("unsupported matrix order {other}, expected 2, 3, 4 or 8")),
        }
    }
}

impl From<MatrixOrder> for u8 {
    fn from(order: MatrixOrder) -> Self {
        match order {
            MatrixOrder::Two => 2,
            MatrixOrder::Three => 3,
            MatrixOrder::Four => 4,
            MatrixOrder::Eight => 8,
        }
    }
}

fn default_threshold() -> u8 {
    DEFAULT_THRESHOLD
}

fn default_weight_base() -> u32 {
    DEFAULT_WEIGHT_BASE
}

/// One algorithm and its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum DitherConfig {
    Threshold {
        #[serde(default = "default_threshold")]
        threshold: u8,
    },
    RandomThreshold {
        max_threshold: u32,
    },
    ImportanceSampling {
        samples: usize,
        threshold: u8,
        #[serde(default = "default_weight_base")]
        weight_base: u32,
    },
    Grid {
        cell_size: u32,
        alpha: f64,
        beta: f64,
    },
    Ordered {
        order: MatrixOrder,
    },
    ErrorDiffusion {
        kernel: KernelName,
    },
    Stippling {
        sites: usize,
        iterations: usize,
    },
}

impl DitherConfig {
    /// Validate the parameters and build the algorithm.
    pub fn build(&self) -> Result<Box<dyn Ditherer>> {
        let ditherer: Box<dyn Ditherer> = match *self {
            DitherConfig::Threshold { threshold } => Box::new(ThresholdDitherer::new(threshold)),
            DitherConfig::RandomThreshold { max_threshold } => {
                Box::new(RandomThresholdDitherer::new(max_threshold)?)
            }
            DitherConfig::ImportanceSampling {
                samples,
                threshold,
                weight_base,
            } => Box::new(ImportanceSampling::new(samples, threshold).with_weight_base(weight_base)?),
            DitherConfig::Grid {
                cell_size,
                alpha,
                beta,
            } => Box::new(GridDitherer::new(cell_size, alpha, beta)?),
            DitherConfig::Ordered { order } => Box::new(OrderedDitherer::new(order.pattern())),
            DitherConfig::ErrorDiffusion { kernel } => {
                Box::new(ErrorDiffusionDitherer::new(kernel.as_str(), kernel.kernel()))
            }
            DitherConfig::Stippling { sites, iterations } => {
                Box::new(StipplingDitherer::new(sites, iterations)?)
            }
        };
        Ok(ditherer)
    }
}

/// A configured algorithm and the file name its result is written to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStep {
    pub output: String,
    #[serde(flatten)]
    pub config: DitherConfig,
}

/// Voronoi relaxation rendered as region and/or site images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoronoiConfig {
    pub sites: usize,
    pub iterations: usize,
    #[serde(default)]
    pub regions_output: Option<String>,
    #[serde(default)]
    pub sites_output: Option<String>,
    #[serde(default)]
    pub mark_sites: bool,
}

/// Full batch description: one input, many outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub input: PathBuf,
    #[serde(default)]
    pub output_dir: PathBuf,
    /// Seed for the shared random source; drawn from entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub steps: Vec<PipelineStep>,
    #[serde(default)]
    pub voronoi: Option<VoronoiConfig>,
}

impl PipelineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Where a step's (or Voronoi pass's) output file lands.
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}
