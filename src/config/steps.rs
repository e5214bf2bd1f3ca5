// src/config/steps.rs

//! Per-step option structs for `[task.<name>].steps`.
//!
//! Every step kind has its own struct with one field per recognised option,
//! selected by the `kind` tag:
//!
//! ```toml
//! steps = [
//!   { kind = "sass", style = "compressed" },
//!   { kind = "css", browsers = ["last 2 versions"] },
//! ]
//! ```

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepConfig {
    Copy,
    Sass(SassOptions),
    Css(CssOptions),
    Bundle(BundleOptions),
    Image(ImageOptions),
}

impl StepConfig {
    pub fn name(&self) -> &'static str {
        match self {
            StepConfig::Copy => "copy",
            StepConfig::Sass(_) => "sass",
            StepConfig::Css(_) => "css",
            StepConfig::Bundle(_) => "bundle",
            StepConfig::Image(_) => "image",
        }
    }
}

/// Options for the external Sass compiler.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SassOptions {
    /// Executable name or path.
    #[serde(default = "default_sass_program")]
    pub program: String,

    #[serde(default)]
    pub style: SassStyle,

    /// Extra `--load-path` directories, relative to the project root. The
    /// directory of each entry file is always a load path.
    #[serde(default)]
    pub load_paths: Vec<String>,

    /// Embed an inline source map in the compiled CSS.
    #[serde(default)]
    pub source_map: bool,

    /// Silence deprecation warnings coming from dependencies.
    #[serde(default)]
    pub quiet_deps: bool,
}

fn default_sass_program() -> String {
    "sass".to_string()
}

impl Default for SassOptions {
    fn default() -> Self {
        Self {
            program: default_sass_program(),
            style: SassStyle::default(),
            load_paths: Vec::new(),
            source_map: false,
            quiet_deps: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SassStyle {
    #[default]
    Expanded,
    Compressed,
}

impl SassStyle {
    pub fn as_arg(&self) -> &'static str {
        match self {
            SassStyle::Expanded => "expanded",
            SassStyle::Compressed => "compressed",
        }
    }
}

/// Options for CSS post-processing (vendor prefixing + minification).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CssOptions {
    #[serde(default = "default_true")]
    pub minify: bool,

    /// Browserslist queries used to decide which prefixes to emit.
    #[serde(default = "default_browsers")]
    pub browsers: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_browsers() -> Vec<String> {
    vec!["defaults".to_string()]
}

impl Default for CssOptions {
    fn default() -> Self {
        Self {
            minify: true,
            browsers: default_browsers(),
        }
    }
}

/// Options for the external JavaScript bundler.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BundleOptions {
    /// Executable name or path.
    #[serde(default = "default_bundle_program")]
    pub program: String,

    #[serde(default)]
    pub mode: BundleMode,

    /// Output file name; defaults to the entry's file name.
    #[serde(default)]
    pub filename: Option<String>,

    /// Emit an external `.map` file. Defaults to `true` in development and
    /// `false` in production.
    #[serde(default)]
    pub source_map: Option<bool>,

    /// Language target passed to the bundler.
    #[serde(default = "default_target")]
    pub target: String,

    /// Module specifiers left unbundled.
    #[serde(default)]
    pub external: Vec<String>,
}

fn default_bundle_program() -> String {
    "esbuild".to_string()
}

fn default_target() -> String {
    "es2015".to_string()
}

impl Default for BundleOptions {
    fn default() -> Self {
        Self {
            program: default_bundle_program(),
            mode: BundleMode::default(),
            filename: None,
            source_map: None,
            target: default_target(),
            external: Vec::new(),
        }
    }
}

impl BundleOptions {
    pub fn effective_source_map(&self) -> bool {
        self.source_map
            .unwrap_or(self.mode == BundleMode::Development)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleMode {
    #[default]
    Development,
    Production,
}

/// Options for image optimisation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImageOptions {
    /// JPEG re-encode quality, 1-100.
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    #[serde(default)]
    pub png_compression: PngCompression,

    #[serde(default)]
    pub svg: SvgOptions,

    /// Keep the optimised output even when it is larger than the input.
    #[serde(default)]
    pub keep_larger: bool,
}

fn default_jpeg_quality() -> u8 {
    75
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            jpeg_quality: default_jpeg_quality(),
            png_compression: PngCompression::default(),
            svg: SvgOptions::default(),
            keep_larger: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PngCompression {
    Fast,
    Default,
    #[default]
    Best,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SvgOptions {
    /// Resolution used to resolve physical units (`mm`, `in`, `pt`).
    #[serde(default = "default_svg_dpi")]
    pub dpi: f32,

    /// Decimal places kept for coordinates and transforms.
    #[serde(default = "default_svg_precision")]
    pub precision: u8,

    /// Prefix for ids generated for gradients, clip paths and masks.
    #[serde(default)]
    pub id_prefix: Option<String>,
}

fn default_svg_dpi() -> f32 {
    96.0
}

fn default_svg_precision() -> u8 {
    3
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            dpi: default_svg_dpi(),
            precision: default_svg_precision(),
            id_prefix: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Steps {
        steps: Vec<StepConfig>,
    }

    #[test]
    fn steps_deserialize_by_kind_with_defaults() {
        let parsed: Steps = toml::from_str(
            r#"
steps = [
  { kind = "sass", style = "compressed" },
  { kind = "css" },
  { kind = "bundle", mode = "production", filename = "script.js" },
  { kind = "image", svg = { precision = 2, id_prefix = "icon-" } },
  { kind = "copy" },
]
"#,
        )
        .unwrap();

        assert_eq!(
            parsed.steps[0],
            StepConfig::Sass(SassOptions {
                style: SassStyle::Compressed,
                ..SassOptions::default()
            })
        );
        assert_eq!(parsed.steps[1], StepConfig::Css(CssOptions::default()));

        match &parsed.steps[2] {
            StepConfig::Bundle(opts) => {
                assert_eq!(opts.mode, BundleMode::Production);
                assert_eq!(opts.filename.as_deref(), Some("script.js"));
                assert!(!opts.effective_source_map());
            }
            other => panic!("unexpected step: {other:?}"),
        }

        match &parsed.steps[3] {
            StepConfig::Image(opts) => {
                assert_eq!(opts.jpeg_quality, 75);
                assert_eq!(opts.svg.dpi, 96.0);
                assert_eq!(opts.svg.precision, 2);
                assert_eq!(opts.svg.id_prefix.as_deref(), Some("icon-"));
            }
            other => panic!("unexpected step: {other:?}"),
        }

        assert_eq!(parsed.steps[4], StepConfig::Copy);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let res: Result<Steps, _> = toml::from_str(r#"steps = [{ kind = "webpack" }]"#);
        assert!(res.is_err());
    }
}
