// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod orchestrator;
pub mod pipeline;
pub mod server;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::cli::{CliArgs, Command, ServeArgs};
use crate::config::defaults::DEFAULT_CONFIG_TOML;
use crate::config::{ConfigFile, load_or_builtin};
use crate::dag::BuildGraph;
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions};
use crate::exec::PipelineExecutor;
use crate::fs::{FileSystem, RealFileSystem};
use crate::orchestrator::Orchestrator;
use crate::server::{DevServer, ReloadHub, forward_completions};
use crate::watch::WatchController;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file or built-in pipeline)
/// - the orchestrator for `build` / `run` / `clean`
/// - dev server, watcher, watch runtime and executor for `watch` / `default`
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let command = args
        .command
        .unwrap_or_else(|| Command::Default(ServeArgs::default()));

    match command {
        Command::Init { force } => init_config(&config_path, force),
        command => run_command(command, &config_path).await,
    }
}

async fn run_command(command: Command, config_path: &Path) -> Result<()> {
    let cfg = load_or_builtin(config_path)?;
    let root = config_root_dir(config_path);
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    match command {
        Command::Build => {
            let orchestrator = Orchestrator::from_config(&cfg, fs, &root);
            orchestrator.build().await?;
        }
        Command::Run { tasks } => {
            let orchestrator = Orchestrator::from_config(&cfg, fs, &root);
            orchestrator.run_tasks(&tasks).await?;
        }
        Command::Clean => {
            let orchestrator = Orchestrator::from_config(&cfg, fs, &root);
            orchestrator.clean().await?;
            info!(dir = %orchestrator.paths().out_root.display(), "output removed");
        }
        Command::List => print_plan(&cfg)?,
        Command::Watch(serve) => serve_and_watch(apply_port(cfg, &serve), fs, root, false).await?,
        Command::Default(serve) => serve_and_watch(apply_port(cfg, &serve), fs, root, true).await?,
        Command::Init { force } => init_config(config_path, force)?,
    }

    Ok(())
}

fn apply_port(cfg: ConfigFile, serve: &ServeArgs) -> ConfigFile {
    match serve.port {
        Some(port) => cfg.with_port(port),
        None => cfg,
    }
}

/// Bind the dev server, start watching and run the watch runtime until
/// Ctrl-C. With `with_build`, a full build runs alongside.
async fn serve_and_watch(
    cfg: ConfigFile,
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
    with_build: bool,
) -> Result<()> {
    let settings = cfg.settings().clone();
    let orchestrator = Arc::new(Orchestrator::from_config(&cfg, fs.clone(), &root));

    // Bind first: an occupied port must fail before anything else starts.
    let hub = Arc::new(ReloadHub::new());
    let server = DevServer::bind(
        orchestrator.paths().out_root.clone(),
        &settings.host,
        settings.port,
        hub.clone(),
        settings.notify,
    )
    .await?;
    let addr = server.local_addr();
    let _forwarder = forward_completions(orchestrator.subscribe(), hub);

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let mut watcher = WatchController::from_config(&cfg, &root, fs)?;
    watcher.start(rt_tx.clone())?;
    info!(
        dir = %watcher.watch_dir().display(),
        rules = watcher.rules().len(),
        url = %format!("http://{addr}"),
        "watching for changes"
    );

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let server_task = tokio::spawn(async move {
        if let Err(e) = server.serve().await {
            error!(error = %e, "dev server stopped");
        }
    });

    if with_build {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move {
            // Failures are already logged per task; keep watching.
            if let Err(e) = orchestrator.build().await {
                error!(error = %e, "initial build failed");
            }
        });
    }

    let options = RuntimeOptions {
        overlap: settings.overlap,
        exit_when_idle: false,
    };
    let names: Vec<String> = orchestrator.registry().names().map(str::to_string).collect();
    let core = CoreRuntime::new(names, options);
    let executor = PipelineExecutor::new(orchestrator, rt_tx);

    let result = Runtime::new(core, rt_rx, executor).run().await;

    watcher.stop();
    server_task.abort();
    result?;
    Ok(())
}

/// Figure out the project root.
///
/// - If the config path has a non-empty parent (e.g. "site/Assetpipe.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Assetpipe.toml" (parent = ""),
///   we fall back to the current working directory "."
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Write the built-in pipeline to `path`.
fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists; pass --force to overwrite it",
            path.display()
        );
    }
    std::fs::write(path, DEFAULT_CONFIG_TOML)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("wrote {}", path.display());
    Ok(())
}

/// Dry-run output: tasks, steps, watch rules and build stages.
fn print_plan(cfg: &ConfigFile) -> Result<()> {
    let settings = cfg.settings();
    println!("assetpipe plan");
    println!("  config.src = {}", settings.src);
    println!("  config.dest = {}", settings.dest);
    println!("  config.server = {}:{}", settings.host, settings.port);
    println!("  config.overlap = {:?}", settings.overlap);
    println!("  config.debounce_ms = {}", settings.debounce_ms);
    println!();

    println!("tasks ({}):", cfg.tasks().len());
    for (name, task) in cfg.tasks() {
        println!("  - {name}");
        println!("      src: {}", task.src);
        if !task.exclude.is_empty() {
            println!("      exclude: {:?}", task.exclude);
        }
        println!("      dest: {}/{}", settings.dest, task.dest);
        let steps: Vec<_> = task.steps.iter().map(|s| s.name()).collect();
        if steps.is_empty() {
            println!("      steps: copy");
        } else {
            println!("      steps: {}", steps.join(" -> "));
        }
        println!("      reload: {}", task.reload);
        if !task.after.is_empty() {
            println!("      after: {:?}", task.after);
        }
        if !task.include_in_build {
            println!("      include_in_build: false");
        }
    }
    println!();

    let rules = cfg.effective_watch_rules();
    println!("watch ({}):", rules.len());
    for rule in &rules {
        println!("  - {:?} -> {:?}", rule.patterns, rule.tasks);
        if !rule.exclude.is_empty() {
            println!("      exclude: {:?}", rule.exclude);
        }
        if rule.use_hash {
            println!("      use_hash: true");
        }
    }
    println!();

    let registry = orchestrator::TaskRegistry::from_config(cfg);
    let graph = BuildGraph::from_registry(&registry)?;
    println!("build: {}", graph.composition());
    for (i, stage) in graph.stages().iter().enumerate() {
        println!("  stage {i}: {}", stage.join(", "));
    }

    Ok(())
}
