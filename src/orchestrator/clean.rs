// src/orchestrator/clean.rs

use std::io;
use std::path::{Component, Path};

use tracing::{debug, info};

use crate::errors::{PipelineError, Result};
use crate::fs::FileSystem;

/// Remove `target` recursively. Removing a directory that does not exist is
/// not an error.
///
/// `target` must live strictly inside `root`; the root itself and anything
/// reached through `..` are refused.
pub fn clean_dir(fs: &dyn FileSystem, root: &Path, target: &Path) -> Result<()> {
    let inside = target
        .strip_prefix(root)
        .ok()
        .filter(|rel| !rel.as_os_str().is_empty())
        .is_some_and(|rel| rel.components().all(|c| matches!(c, Component::Normal(_))));

    if !inside {
        return Err(PipelineError::ConfigError(format!(
            "refusing to clean {}: not a directory inside {}",
            target.display(),
            root.display()
        )));
    }

    match fs.remove_dir_all(target) {
        Ok(()) => {
            info!(dir = %target.display(), "cleaned output directory");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(dir = %target.display(), "output directory already absent");
            Ok(())
        }
        Err(e) => Err(PipelineError::fs(target, e)),
    }
}
