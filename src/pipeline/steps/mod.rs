// src/pipeline/steps/mod.rs

//! Transformation steps.
//!
//! Each step maps `Vec<Asset> -> Vec<Asset>`. CPU-bound steps (CSS, images)
//! run on the blocking pool; tool-backed steps (Sass, bundler) await child
//! processes. Any failure is reported as [`PipelineError::Transformation`]
//! naming the task and step.

pub mod bundle;
pub mod css;
pub mod image;
pub mod sass;
pub mod svg;

use std::path::PathBuf;

use anyhow::anyhow;

use crate::config::steps::StepConfig;
use crate::errors::{PipelineError, Result};
use crate::pipeline::Asset;

/// What a step needs to know about the task it runs in.
#[derive(Debug, Clone)]
pub struct StepContext {
    pub task: String,
    /// Project root; relative option paths resolve against it and external
    /// tools run with it as working directory.
    pub root: PathBuf,
}

/// Apply one configured step to a batch of assets.
pub async fn apply_step(
    step: &StepConfig,
    ctx: &StepContext,
    assets: Vec<Asset>,
) -> Result<Vec<Asset>> {
    let result = match step {
        StepConfig::Copy => Ok(assets),
        StepConfig::Sass(opts) => sass::compile_all(ctx, opts, assets).await,
        StepConfig::Css(opts) => {
            let opts = opts.clone();
            blocking(move || css::process_all(&opts, assets)).await
        }
        StepConfig::Bundle(opts) => bundle::bundle_all(ctx, opts, assets).await,
        StepConfig::Image(opts) => {
            let opts = opts.clone();
            blocking(move || image::optimize_all(&opts, assets)).await
        }
    };

    result.map_err(|e| PipelineError::Transformation {
        task: ctx.task.clone(),
        step: step.name(),
        message: format!("{e:#}"),
    })
}

async fn blocking<F, T>(f: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| anyhow!("worker thread failed: {e}"))?
}
