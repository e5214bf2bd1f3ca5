// src/pipeline/steps/css.rs

//! CSS post-processing with lightningcss: vendor prefixes for the configured
//! browser targets, then optional minification.

use anyhow::{Context, Result, anyhow};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};

use crate::config::steps::CssOptions;
use crate::pipeline::Asset;

pub fn process_all(opts: &CssOptions, assets: Vec<Asset>) -> Result<Vec<Asset>> {
    let targets = resolve_targets(&opts.browsers)?;

    assets
        .into_iter()
        .map(|mut asset| {
            if asset.extension().as_deref() != Some("css") {
                return Ok(asset);
            }
            let source = std::str::from_utf8(&asset.contents)
                .with_context(|| format!("{} is not valid UTF-8", asset.relative.display()))?;
            let filename = asset.relative.display().to_string();
            let css = process_css(source, &filename, opts.minify, targets.clone())?;
            asset.contents = css.into_bytes();
            Ok(asset)
        })
        .collect()
}

/// Parse, prefix and print one stylesheet.
pub fn process_css(source: &str, filename: &str, minify: bool, targets: Targets) -> Result<String> {
    let mut sheet = StyleSheet::parse(
        source,
        ParserOptions {
            filename: filename.to_string(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| anyhow!("{filename}: {e}"))?;

    sheet
        .minify(MinifyOptions {
            targets: targets.clone(),
            ..MinifyOptions::default()
        })
        .map_err(|e| anyhow!("{filename}: {e}"))?;

    let printed = sheet
        .to_css(PrinterOptions {
            minify,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| anyhow!("{filename}: {e}"))?;

    Ok(printed.code)
}

/// Resolve browserslist queries; an empty list means "no prefixing".
pub fn resolve_targets(queries: &[String]) -> Result<Targets> {
    if queries.is_empty() {
        return Ok(Targets::default());
    }
    let browsers = Browsers::from_browserslist(queries.iter().map(String::as_str))
        .map_err(|e| anyhow!("invalid browserslist query {queries:?}: {e}"))?;
    Ok(Targets {
        browsers,
        ..Targets::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minifies_when_asked() {
        let out = process_css(".a {\n  color: #ff0000;\n}\n", "a.css", true, Targets::default())
            .unwrap();
        assert_eq!(out, ".a{color:red}");
    }

    #[test]
    fn prefixes_for_old_targets() {
        let targets = resolve_targets(&["safari 10".to_string()]).unwrap();
        let out = process_css(".a { user-select: none; }", "a.css", true, targets).unwrap();
        assert!(out.contains("-webkit-user-select:none"), "got {out}");
    }

    #[test]
    fn non_css_assets_pass_through() {
        let assets = vec![Asset::new("/p/a.map", "a.map", b"{}".to_vec())];
        let out = process_all(&CssOptions::default(), assets.clone()).unwrap();
        assert_eq!(out, assets);
    }

    #[test]
    fn bad_browserslist_query_is_an_error() {
        assert!(resolve_targets(&["not a real browser 99".to_string()]).is_err());
    }
}
