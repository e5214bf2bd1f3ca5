// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::cli::DEFAULT_CONFIG_FILE;
use crate::config::defaults::DEFAULT_CONFIG_TOML;
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{PipelineError, Result};

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| PipelineError::fs(path, e))?;
    parse_str(&contents)
}

/// Parse raw configuration from a TOML string.
pub fn parse_str(contents: &str) -> Result<RawConfigFile> {
    let config: RawConfigFile = toml::from_str(contents)?;
    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// Checks for unknown `after` / watch task references, build graph cycles,
/// invalid globs and unsafe output paths.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    ConfigFile::try_from(raw_config)
}

/// The built-in pipeline, validated.
pub fn builtin_config() -> Result<ConfigFile> {
    ConfigFile::try_from(parse_str(DEFAULT_CONFIG_TOML)?)
}

/// Load `path`, falling back to the built-in pipeline when `path` is the
/// default file name and does not exist.
///
/// An explicitly named config file that is missing is still an error.
pub fn load_or_builtin(path: &Path) -> Result<ConfigFile> {
    if !path.exists() && path == default_config_path() {
        info!(
            "no {} found; using the built-in pipeline",
            DEFAULT_CONFIG_FILE
        );
        return builtin_config();
    }
    load_and_validate(path)
}

/// Default config path in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}
