//! Batch runner: applies every algorithm listed in a JSON pipeline config to
//! one input image and writes each result as PNG.
//!
//! Usage: `halftone [CONFIG]`. The config path falls back to the
//! `HALFTONE_CONFIG` environment variable (a `.env` file is honoured).

use std::path::PathBuf;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use halftone::{Pipeline, PipelineConfig, load_gray, seeded_rng};

const CONFIG_ENV: &str = "HALFTONE_CONFIG";

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config_path = config_path(std::env::args().nth(1), std::env::var(CONFIG_ENV).ok())
        .with_context(|| format!("Usage: halftone <config.json> (or set {CONFIG_ENV})"))?;

    let config = PipelineConfig::load(&config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;
    let pipeline = Pipeline::from_config(&config).context("Invalid pipeline config")?;

    let gray = load_gray(&config.input)
        .with_context(|| format!("Failed to load image {}", config.input.display()))?;
    tracing::info!(
        input = %config.input.display(),
        width = gray.width(),
        height = gray.height(),
        steps = pipeline.len(),
        "Starting halftone pipeline"
    );

    let mut rng = seeded_rng(config.seed);
    let outputs = pipeline.run(&gray, &mut rng)?;

    for output in &outputs {
        output
            .save(&config.output_dir)
            .with_context(|| format!("Failed to save {}", output.output))?;
        tracing::info!(path = %config.output_path(&output.output).display(), "Saved");
    }

    tracing::info!(count = outputs.len(), "Done");
    Ok(())
}

/// The command-line argument wins over the environment variable.
fn config_path(arg: Option<String>, env: Option<String>) -> Option<PathBuf> {
    arg.or(env)
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
}
