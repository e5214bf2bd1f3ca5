// src/pipeline/steps/sass.rs

//! SCSS / Sass compilation through the external `sass` executable.
//!
//! Each entry is piped over stdin (`sass --stdin`) and the compiled CSS read
//! back from stdout. Partials (`_name.scss`) are only ever imported, so they
//! are dropped from the output set.

use anyhow::{Context, Result};
use tracing::debug;

use crate::config::steps::SassOptions;
use crate::exec::tool::ToolCommand;
use crate::pipeline::Asset;
use crate::pipeline::steps::StepContext;

pub async fn compile_all(
    ctx: &StepContext,
    opts: &SassOptions,
    assets: Vec<Asset>,
) -> Result<Vec<Asset>> {
    let mut out = Vec::with_capacity(assets.len());

    for asset in assets {
        match asset.extension().as_deref() {
            Some("scss") | Some("sass") => {
                if is_partial(&asset) {
                    debug!(task = %ctx.task, file = ?asset.relative, "skipping sass partial");
                    continue;
                }
                out.push(compile_one(ctx, opts, asset).await?);
            }
            _ => out.push(asset),
        }
    }

    Ok(out)
}

fn is_partial(asset: &Asset) -> bool {
    asset.file_name().is_some_and(|n| n.starts_with('_'))
}

/// Arguments for one `sass --stdin` invocation.
pub fn sass_args(ctx: &StepContext, opts: &SassOptions, asset: &Asset) -> Vec<String> {
    let mut args = vec![
        "--stdin".to_string(),
        format!("--style={}", opts.style.as_arg()),
        format!("--load-path={}", asset.origin_dir().display()),
    ];

    for path in opts.load_paths.iter() {
        args.push(format!("--load-path={}", ctx.root.join(path).display()));
    }

    if asset.extension().as_deref() == Some("sass") {
        args.push("--indented".to_string());
    }

    if opts.source_map {
        args.push("--embed-source-map".to_string());
    } else {
        args.push("--no-source-map".to_string());
    }

    if opts.quiet_deps {
        args.push("--quiet-deps".to_string());
    }

    args
}

async fn compile_one(ctx: &StepContext, opts: &SassOptions, asset: Asset) -> Result<Asset> {
    let output = ToolCommand::new(&opts.program)
        .args(sass_args(ctx, opts, &asset))
        .cwd(&ctx.root)
        .stdin(asset.contents.clone())
        .run()
        .await
        .with_context(|| format!("compiling {}", asset.origin.display()))?;

    let stem = asset
        .relative
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("style")
        .to_string();

    let mut compiled = asset.renamed(&format!("{stem}.css"));
    compiled.contents = output.stdout;
    Ok(compiled)
}
