//! Runs a configured list of algorithms over one source image.

use std::path::Path;

use image::{GrayImage, RgbImage};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::{debug, info};

use crate::Result;
use crate::config::{PipelineConfig, VoronoiConfig};
use crate::ditherer::Ditherer;
use crate::gray::invert_gray;
use crate::io::save_png;
use crate::voronoi::{draw_regions, draw_sites, random_sites, relax};

/// A produced image, binary or colored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineImage {
    Gray(GrayImage),
    Rgb(RgbImage),
}

/// One result of a pipeline run and the file name it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutput {
    pub output: String,
    pub image: PipelineImage,
}

impl PipelineOutput {
    /// Write the image as PNG under `dir`.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        let path = dir.as_ref().join(&self.output);
        match &self.image {
            PipelineImage::Gray(img) => save_png(img, path),
            PipelineImage::Rgb(img) => save_png(img, path),
        }
    }
}

/// Random source for a run: seeded when a seed is given, from entropy otherwise.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Validated algorithms ready to run.
pub struct Pipeline {
    steps: Vec<(String, Box<dyn Ditherer>)>,
    voronoi: Option<VoronoiConfig>,
}

impl Pipeline {
    /// Build every configured step, failing on the first invalid one.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let steps = config
            .steps
            .iter()
            .map(|step| Ok((step.output.clone(), step.config.build()?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            steps,
            voronoi: config.voronoi.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Apply every step to `gray`, then the Voronoi pass if configured.
    ///
    /// Steps share `rng` in order, so a seeded source reproduces the whole run.
    pub fn run(&self, gray: &GrayImage, rng: &mut dyn RngCore) -> Result<Vec<PipelineOutput>> {
        let mut outputs = Vec::with_capacity(self.steps.len() + 2);

        for (output, ditherer) in &self.steps {
            info!(algorithm = ditherer.name(), output = %output, "Running step");
            let image = ditherer.apply(gray, rng)?;
            outputs.push(PipelineOutput {
                output: output.clone(),
                image: PipelineImage::Gray(image),
            });
        }

        if let Some(voronoi) = &self.voronoi {
            outputs.extend(run_voronoi(voronoi, gray, rng)?);
        }

        debug!(outputs = outputs.len(), "Pipeline complete");
        Ok(outputs)
    }
}

fn run_voronoi(
    config: &VoronoiConfig,
    gray: &GrayImage,
    rng: &mut dyn RngCore,
) -> Result<Vec<PipelineOutput>> {
    info!(
        sites = config.sites,
        iterations = config.iterations,
        "Running Voronoi relaxation"
    );
    let (width, height) = gray.dimensions();
    let sites = random_sites(config.sites, width, height, rng)?;
    let tessellation = relax(&sites, &invert_gray(gray), config.iterations)?;

    let mut outputs = Vec::new();
    if let Some(output) = &config.regions_output {
        outputs.push(PipelineOutput {
            output: output.clone(),
            image: PipelineImage::Rgb(draw_regions(&tessellation, config.mark_sites, rng)),
        });
    }
    if let Some(output) = &config.sites_output {
        outputs.push(PipelineOutput {
            output: output.clone(),
            image: PipelineImage::Gray(draw_sites(&tessellation)),
        });
    }
    Ok(outputs)
}
