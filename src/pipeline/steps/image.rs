// src/pipeline/steps/image.rs

//! Lossy/lossless image optimisation.
//!
//! JPEG is re-encoded at the configured quality, PNG re-encoded with the
//! strongest compression requested, SVG minified through `usvg`. Anything else
//! (GIF, fonts, icons) passes through untouched. Unless `keep_larger` is set,
//! the original bytes win whenever the optimised result is not smaller.

use std::io::Cursor;

use anyhow::{Context, Result};
use image::ImageFormat;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use tracing::trace;

use crate::config::steps::{ImageOptions, PngCompression};
use crate::pipeline::Asset;
use crate::pipeline::steps::svg::optimize_svg;

pub fn optimize_all(opts: &ImageOptions, assets: Vec<Asset>) -> Result<Vec<Asset>> {
    assets
        .into_iter()
        .map(|asset| optimize_one(opts, asset))
        .collect()
}

fn optimize_one(opts: &ImageOptions, mut asset: Asset) -> Result<Asset> {
    let optimized = match asset.extension().as_deref() {
        Some("jpg") | Some("jpeg") => encode_jpeg(&asset.contents, opts.jpeg_quality)
            .with_context(|| format!("optimising {}", asset.relative.display()))?,
        Some("png") => encode_png(&asset.contents, opts.png_compression)
            .with_context(|| format!("optimising {}", asset.relative.display()))?,
        Some("svg") => optimize_svg(&asset.contents, &opts.svg)
            .with_context(|| format!("optimising {}", asset.relative.display()))?,
        _ => return Ok(asset),
    };

    trace!(
        file = ?asset.relative,
        before = asset.contents.len(),
        after = optimized.len(),
        "image optimised"
    );

    if opts.keep_larger || optimized.len() < asset.contents.len() {
        asset.contents = optimized;
    }
    Ok(asset)
}

pub fn encode_jpeg(bytes: &[u8], quality: u8) -> Result<Vec<u8>> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
        .context("decoding JPEG")?;
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut out), quality);
    img.write_with_encoder(encoder).context("encoding JPEG")?;
    Ok(out)
}

pub fn encode_png(bytes: &[u8], compression: PngCompression) -> Result<Vec<u8>> {
    let img =
        image::load_from_memory_with_format(bytes, ImageFormat::Png).context("decoding PNG")?;
    let compression = match compression {
        PngCompression::Fast => CompressionType::Fast,
        PngCompression::Default => CompressionType::Default,
        PngCompression::Best => CompressionType::Best,
    };
    let mut out = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(Cursor::new(&mut out), compression, FilterType::Adaptive);
    img.write_with_encoder(encoder).context("encoding PNG")?;
    Ok(out)
}
