// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `assetpipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetpipe",
    version,
    about = "Build static-site assets, watch sources and serve them with live reload.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// When the default file is missing, the built-in pipeline is used.
    #[arg(long, global = true, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETPIPE_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Command to run; `default` when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

pub const DEFAULT_CONFIG_FILE: &str = "Assetpipe.toml";

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Clean the output directory, then run every build task.
    Build,
    /// Start the dev server and re-run tasks when their sources change.
    Watch(ServeArgs),
    /// Run `watch` and `build` concurrently.
    Default(ServeArgs),
    /// Run the named tasks in parallel, without cleaning.
    Run {
        /// Task names as declared in the config.
        #[arg(required = true, value_name = "TASK")]
        tasks: Vec<String>,
    },
    /// Remove the output directory.
    Clean,
    /// Print tasks, watch rules and build stages without running anything.
    List,
    /// Write the built-in pipeline to the config path.
    Init {
        /// Overwrite an existing config file.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Default, clap::Args)]
pub struct ServeArgs {
    /// Override `[config].port`.
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
