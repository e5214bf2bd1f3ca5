// src/config/mod.rs

//! Configuration loading and validation for assetpipe.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`, `steps.rs`).
//! - Load a config file from disk, or the built-in pipeline (`loader.rs`,
//!   `defaults.rs`).
//! - Validate invariants like task references and build graph acyclicity
//!   (`validate.rs`).

pub mod defaults;
pub mod loader;
pub mod model;
pub mod steps;
pub mod validate;

pub use loader::{builtin_config, load_and_validate, load_from_path, load_or_builtin, parse_str};
pub use model::{ConfigFile, ConfigSection, RawConfigFile, TaskConfig, WatchRuleConfig};
pub use steps::{
    BundleMode, BundleOptions, CssOptions, ImageOptions, PngCompression, SassOptions, SassStyle,
    StepConfig, SvgOptions,
};
