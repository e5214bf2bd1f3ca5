// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::config::steps::StepConfig;
use crate::types::{OverlapBehaviour, ReloadKind};

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// dest = "dist"
/// port = 3000
///
/// [task.css-task]
/// src = "src/assets/sass/style.scss"
/// dest = "assets/css"
/// reload = "styles"
/// steps = [{ kind = "sass" }, { kind = "css" }]
///
/// [[watch]]
/// patterns = ["src/assets/sass/**/*.scss"]
/// tasks = ["css-task"]
/// ```
///
/// All sections except `[task.*]` are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Global settings from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,

    /// Watch rules from `[[watch]]`.
    ///
    /// When empty, one rule per task is derived from its `src`/`exclude`.
    #[serde(default)]
    pub watch: Vec<WatchRuleConfig>,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (see `validate.rs`), so
/// holders can rely on task references being resolvable and the build graph
/// being acyclic.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    task: BTreeMap<String, TaskConfig>,
    watch: Vec<WatchRuleConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        task: BTreeMap<String, TaskConfig>,
        watch: Vec<WatchRuleConfig>,
    ) -> Self {
        Self {
            config,
            task,
            watch,
        }
    }

    pub fn settings(&self) -> &ConfigSection {
        &self.config
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskConfig> {
        &self.task
    }

    pub fn task(&self, name: &str) -> Option<&TaskConfig> {
        self.task.get(name)
    }

    /// Explicit `[[watch]]` rules, or rules derived from each task's source
    /// glob when none are configured.
    pub fn effective_watch_rules(&self) -> Vec<WatchRuleConfig> {
        if !self.watch.is_empty() {
            return self.watch.clone();
        }

        self.task
            .iter()
            .map(|(name, task)| WatchRuleConfig {
                patterns: vec![task.src.clone()],
                exclude: task.exclude.clone(),
                tasks: vec![name.clone()],
                use_hash: false,
            })
            .collect()
    }

    /// Override the dev-server port (e.g. from `--port`).
    pub fn with_port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Source tree root; the watcher observes this directory.
    #[serde(default = "default_src")]
    pub src: String,

    /// Output tree root; removed by `clean`, served by the dev server.
    #[serde(default = "default_dest")]
    pub dest: String,

    /// Dev-server bind host.
    #[serde(default = "default_host")]
    pub host: String,

    /// Dev-server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Show an in-page notice when a reload signal arrives.
    #[serde(default = "default_true")]
    pub notify: bool,

    /// `"queue"`, `"cancel"` or `"overlap"`.
    #[serde(default)]
    pub overlap: OverlapBehaviour,

    /// Per-task debounce window for watch events; `0` disables it.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_src() -> String {
    "src".to_string()
}

fn default_dest() -> String {
    "dist".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_true() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    100
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            src: default_src(),
            dest: default_dest(),
            host: default_host(),
            port: default_port(),
            notify: true,
            overlap: OverlapBehaviour::default(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Source glob, relative to the project root (e.g. `"src/js/main.js"`).
    pub src: String,

    /// Globs removed from the `src` match set.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Destination directory, relative to `[config].dest`. Empty means the
    /// output root itself.
    #[serde(default)]
    pub dest: String,

    /// Ordered transformation steps. An empty list copies files unchanged.
    #[serde(default)]
    pub steps: Vec<StepConfig>,

    /// Reload signal emitted to dev-server clients after a successful run.
    #[serde(default)]
    pub reload: ReloadKind,

    /// Whether `build` runs this task.
    #[serde(default = "default_true")]
    pub include_in_build: bool,

    /// Tasks that must finish before this one starts during `build`.
    #[serde(default)]
    pub after: Vec<String>,
}

/// `[[watch]]` entry: glob patterns mapped to the tasks they re-run.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchRuleConfig {
    pub patterns: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,

    pub tasks: Vec<String>,

    /// Only trigger when the changed file's content hash differs from the last
    /// one seen (skips editor touch/save-without-change events).
    #[serde(default)]
    pub use_hash: bool,
}
