// src/pipeline/steps/svg.rs

//! SVG minification through `usvg`.
//!
//! The document is parsed into a render tree and written back without
//! indentation, which drops prologs, comments, editor metadata and unused
//! definitions. Text needs fonts to lay out and no font database is loaded
//! here, so documents containing `<text>` are returned unchanged.

use anyhow::{Context, Result};

use crate::config::steps::SvgOptions;

pub fn optimize_svg(source: &[u8], opts: &SvgOptions) -> Result<Vec<u8>> {
    if has_text(source) {
        return Ok(source.to_vec());
    }

    let parse_options = usvg::Options {
        dpi: opts.dpi,
        ..Default::default()
    };
    let tree = usvg::Tree::from_data(source, &parse_options).context("parsing SVG")?;

    let write_options = usvg::WriteOptions {
        indent: usvg::Indent::None,
        attributes_indent: usvg::Indent::None,
        coordinates_precision: opts.precision,
        transforms_precision: opts.precision,
        id_prefix: opts.id_prefix.clone(),
        ..Default::default()
    };

    Ok(tree.to_string(&write_options).into_bytes())
}

fn has_text(source: &[u8]) -> bool {
    source.windows(5).any(|w| w == b"<text")
}
