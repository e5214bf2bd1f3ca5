// src/watch/event_handler.rs

//! Turns raw filesystem events into task names.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::EventKind;
use notify::event::ModifyKind;
use tracing::{debug, trace};

use crate::engine::TaskName;
use crate::fs::FileSystem;
use crate::watch::hash::ContentHashes;
use crate::watch::path_utils::{is_temp_file, relative_str};
use crate::watch::patterns::WatchRule;

/// Whether an event kind can mean "content changed". Access and
/// metadata-only modifications (mtime, chmod) are noise.
pub fn is_relevant(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) | EventKind::Remove(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    }
}

/// Maps changed paths to the tasks of every matching watch rule.
#[derive(Debug)]
pub struct EventRouter {
    root: PathBuf,
    out_root: PathBuf,
    rules: Vec<WatchRule>,
    hashes: ContentHashes,
    fs: Arc<dyn FileSystem>,
}

impl EventRouter {
    pub fn new(
        root: impl Into<PathBuf>,
        out_root: impl Into<PathBuf>,
        rules: Vec<WatchRule>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            root: root.into(),
            out_root: out_root.into(),
            rules,
            hashes: ContentHashes::new(),
            fs,
        }
    }

    pub fn rules(&self) -> &[WatchRule] {
        &self.rules
    }

    /// Tasks to trigger for a change at `path` (absolute), deduplicated in
    /// rule order.
    pub fn tasks_for_path(&mut self, path: &Path) -> Vec<TaskName> {
        if path.starts_with(&self.out_root) {
            trace!(path = %path.display(), "ignoring change in output directory");
            return Vec::new();
        }
        if is_temp_file(path) {
            trace!(path = %path.display(), "ignoring editor temp file");
            return Vec::new();
        }

        let Some(rel) = relative_str(&self.root, path) else {
            debug!(path = %path.display(), root = %self.root.display(), "path outside project root");
            return Vec::new();
        };

        let mut content_changed: Option<bool> = None;
        let mut tasks: Vec<TaskName> = Vec::new();

        for rule in self.rules.iter() {
            if !rule.matches(&rel) {
                continue;
            }
            if rule.use_hash() {
                let changed = *content_changed
                    .get_or_insert_with(|| self.hashes.changed(self.fs.as_ref(), path));
                if !changed {
                    continue;
                }
            }
            for task in rule.tasks() {
                if !tasks.contains(task) {
                    tasks.push(task.clone());
                }
            }
        }

        if !tasks.is_empty() {
            debug!(path = %rel, ?tasks, "watch match");
        }
        tasks
    }
}
