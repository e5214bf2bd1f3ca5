// src/logging.rs

//! Logging setup for `assetpipe` using `tracing` + `tracing-subscriber`.
//!
//! The chosen level applies to `assetpipe` itself; dependencies (notify,
//! axum, hyper, lightningcss, ...) only get through at `warn`.
//!
//! Priority for determining the filter:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `ASSETPIPE_LOG`: either a bare level ("debug") or full `EnvFilter`
//!    directives ("assetpipe::watch=trace,notify=debug")
//! 3. default to `info`
//!
//! Logs go to STDERR; the build summary is printed on stdout.

use anyhow::{Result, anyhow};
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

/// Level applied to third-party crates.
const DEPENDENCY_LEVEL: &str = "warn";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var("ASSETPIPE_LOG").ok();
    let (filter, level) = build_filter(cli_level, env.as_deref());

    // Module targets only help once there is enough output to need them.
    fmt()
        .with_env_filter(filter)
        .with_target(level >= Level::DEBUG)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("initialising logging: {e}"))?;

    Ok(())
}

/// Resolve the filter and the level `assetpipe` itself logs at.
fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> (EnvFilter, Level) {
    if let Some(lvl) = cli_level {
        let level = level_from_log_level(lvl);
        return (EnvFilter::new(directives_for(level)), level);
    }

    if let Some(raw) = env.map(str::trim).filter(|s| !s.is_empty()) {
        if let Some(level) = parse_level_str(raw) {
            return (EnvFilter::new(directives_for(level)), level);
        }
        match EnvFilter::try_new(raw) {
            Ok(filter) => {
                let level = filter
                    .max_level_hint()
                    .and_then(|hint| hint.into_level())
                    .unwrap_or(Level::INFO);
                return (filter, level);
            }
            Err(e) => eprintln!("assetpipe: ignoring invalid ASSETPIPE_LOG ({e})"),
        }
    }

    (EnvFilter::new(directives_for(Level::INFO)), Level::INFO)
}

fn directives_for(level: Level) -> String {
    format!("{DEPENDENCY_LEVEL},assetpipe={}", level.as_str().to_lowercase())
}

fn level_from_log_level(lvl: LogLevel) -> Level {
    match lvl {
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}
