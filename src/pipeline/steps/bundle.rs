// src/pipeline/steps/bundle.rs

//! JavaScript bundling through the external `esbuild` executable.
//!
//! The bundler resolves imports from disk, so every entry is bundled from its
//! origin path (not from in-memory contents). Output goes to a scratch
//! directory and is read back as assets.

use anyhow::{Context, Result};
use tracing::debug;

use crate::config::steps::{BundleMode, BundleOptions};
use crate::exec::tool::ToolCommand;
use crate::pipeline::Asset;
use crate::pipeline::steps::StepContext;

const SCRIPT_EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "jsx", "ts", "tsx"];

pub async fn bundle_all(
    ctx: &StepContext,
    opts: &BundleOptions,
    assets: Vec<Asset>,
) -> Result<Vec<Asset>> {
    let mut out = Vec::with_capacity(assets.len());

    for asset in assets {
        let is_script = asset
            .extension()
            .is_some_and(|e| SCRIPT_EXTENSIONS.contains(&e.as_str()));
        if !is_script {
            out.push(asset);
            continue;
        }
        out.extend(bundle_one(ctx, opts, asset).await?);
    }

    Ok(out)
}

/// Output file name for one entry: the configured `filename`, else the entry
/// name with a `.js` extension.
pub fn output_name(opts: &BundleOptions, asset: &Asset) -> String {
    if let Some(name) = &opts.filename {
        return name.clone();
    }
    let stem = asset
        .relative
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("bundle");
    format!("{stem}.js")
}

/// Arguments for one bundler invocation writing to `outfile`.
pub fn bundle_args(opts: &BundleOptions, asset: &Asset, outfile: &str) -> Vec<String> {
    let mut args = vec![
        asset.origin.display().to_string(),
        "--bundle".to_string(),
        format!("--outfile={outfile}"),
        format!("--target={}", opts.target),
    ];

    match opts.mode {
        BundleMode::Production => {
            args.push("--minify".to_string());
            args.push("--define:process.env.NODE_ENV=\"production\"".to_string());
        }
        BundleMode::Development => {
            args.push("--define:process.env.NODE_ENV=\"development\"".to_string());
        }
    }

    if opts.effective_source_map() {
        args.push("--sourcemap".to_string());
    }

    for name in opts.external.iter() {
        args.push(format!("--external:{name}"));
    }

    args
}

async fn bundle_one(ctx: &StepContext, opts: &BundleOptions, asset: Asset) -> Result<Vec<Asset>> {
    let scratch = tempfile::tempdir().context("creating bundler output directory")?;
    let name = output_name(opts, &asset);
    let outfile = scratch.path().join(&name);

    ToolCommand::new(&opts.program)
        .args(bundle_args(opts, &asset, &outfile.display().to_string()))
        .cwd(&ctx.root)
        .run()
        .await
        .with_context(|| format!("bundling {}", asset.origin.display()))?;

    let code = tokio::fs::read(&outfile)
        .await
        .with_context(|| format!("reading bundler output {}", outfile.display()))?;

    debug!(task = %ctx.task, entry = ?asset.relative, output = %name, bytes = code.len(), "bundled");

    let mut produced = Vec::with_capacity(2);

    let map_name = format!("{name}.map");
    let map_path = scratch.path().join(&map_name);
    if opts.effective_source_map() && map_path.is_file() {
        let map = tokio::fs::read(&map_path)
            .await
            .with_context(|| format!("reading source map {}", map_path.display()))?;
        produced.push(asset.sibling(&map_name, map));
    }

    let mut bundled = asset.renamed(&name);
    bundled.contents = code;
    produced.insert(0, bundled);

    Ok(produced)
}
