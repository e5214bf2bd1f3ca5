// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling `[[watch]]` glob rules ([`patterns`]).
//! - Wiring up a cross-platform filesystem watcher (`notify`) ([`watcher`]).
//! - Filtering noise: output directory, editor temp files, metadata-only
//!   events, and (per rule) unchanged content ([`event_handler`], [`hash`]).
//! - Debouncing bursts per task ([`debounce`]).
//!
//! It does **not** run tasks; it only turns filesystem changes into
//! `RuntimeEvent::TaskTriggered` for the engine.

pub mod debounce;
pub mod event_handler;
pub mod hash;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use tokio::sync::mpsc;

use crate::config::ConfigFile;
use crate::engine::RuntimeEvent;
use crate::fs::FileSystem;

pub use debounce::TaskDebouncer;
pub use event_handler::EventRouter;
pub use patterns::{WatchRule, build_globset, build_rules_from_config};
pub use watcher::{WatcherHandle, spawn_watcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Watching,
}

/// Owns the watcher lifecycle: `Idle` until [`start`](Self::start), then
/// `Watching` until [`stop`](Self::stop) or drop.
#[derive(Debug)]
pub struct WatchController {
    root: PathBuf,
    watch_dir: PathBuf,
    out_root: PathBuf,
    rules: Vec<WatchRule>,
    debounce: Duration,
    fs: Arc<dyn FileSystem>,
    handle: Option<WatcherHandle>,
}

impl WatchController {
    /// Controller for `cfg` rooted at `root`. The source directory is watched
    /// when it exists, otherwise the whole project root.
    pub fn from_config(cfg: &ConfigFile, root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Result<Self> {
        let root = root.into();
        let settings = cfg.settings();
        let src_dir = root.join(&settings.src);
        let watch_dir = if fs.is_dir(&src_dir) {
            src_dir
        } else {
            root.clone()
        };

        Ok(Self {
            out_root: root.join(&settings.dest),
            watch_dir,
            rules: build_rules_from_config(cfg)?,
            debounce: Duration::from_millis(settings.debounce_ms),
            fs,
            root,
            handle: None,
        })
    }

    pub fn state(&self) -> WatchState {
        if self.handle.is_some() {
            WatchState::Watching
        } else {
            WatchState::Idle
        }
    }

    pub fn watch_dir(&self) -> &Path {
        &self.watch_dir
    }

    pub fn rules(&self) -> &[WatchRule] {
        &self.rules
    }

    /// Start watching; triggers are sent to `runtime_tx`.
    pub fn start(&mut self, runtime_tx: mpsc::Sender<RuntimeEvent>) -> Result<()> {
        if self.handle.is_some() {
            bail!("watcher already running");
        }

        let router = EventRouter::new(
            self.root.clone(),
            self.out_root.clone(),
            self.rules.clone(),
            self.fs.clone(),
        );
        let handle = spawn_watcher(
            self.watch_dir.clone(),
            router,
            TaskDebouncer::new(self.debounce),
            runtime_tx,
        )?;
        self.handle = Some(handle);
        Ok(())
    }

    /// Stop watching and return to `Idle`.
    pub fn stop(&mut self) {
        self.handle = None;
    }
}
