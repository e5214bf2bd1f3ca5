// src/pipeline/mod.rs

//! Per-task file pipeline: resolve sources, run them through the configured
//! steps, write the results.
//!
//! - [`source`] resolves globs into files (with glob-base relative paths).
//! - [`steps`] holds the transformation steps, one module per kind.
//! - [`runner`] drives a single task end to end.

pub mod runner;
pub mod source;
pub mod steps;

use std::path::{Path, PathBuf};

pub use runner::{run_pipeline, TaskReport};
pub use source::{glob_base, resolve_sources, SourceFile};

/// A file in flight through a task's steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Where the asset originally came from on disk. Steps that need real
    /// files (e.g. the bundler resolving imports) read from here.
    pub origin: PathBuf,
    /// Output path relative to the task destination.
    pub relative: PathBuf,
    pub contents: Vec<u8>,
}

impl Asset {
    pub fn new(origin: impl Into<PathBuf>, relative: impl Into<PathBuf>, contents: Vec<u8>) -> Self {
        Self {
            origin: origin.into(),
            relative: relative.into(),
            contents,
        }
    }

    /// Lowercased extension of the output path.
    pub fn extension(&self) -> Option<String> {
        self.relative
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    pub fn file_name(&self) -> Option<&str> {
        self.relative.file_name().and_then(|n| n.to_str())
    }

    /// Same asset, renamed to `file_name` inside its current directory.
    pub fn renamed(mut self, file_name: &str) -> Self {
        self.relative = match self.relative.parent() {
            Some(parent) => parent.join(file_name),
            None => PathBuf::from(file_name),
        };
        self
    }

    /// Sibling asset derived from this one (e.g. a source map).
    pub fn sibling(&self, file_name: &str, contents: Vec<u8>) -> Self {
        let relative = self
            .relative
            .parent()
            .map(|p| p.join(file_name))
            .unwrap_or_else(|| PathBuf::from(file_name));
        Self {
            origin: self.origin.clone(),
            relative,
            contents,
        }
    }

    pub fn origin_dir(&self) -> &Path {
        self.origin.parent().unwrap_or_else(|| Path::new("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rename_keeps_directory() {
        let asset = Asset::new("/p/src/sass/style.scss", "nested/style.scss", Vec::new());
        let css = asset.renamed("style.css");
        assert_eq!(css.relative, PathBuf::from("nested/style.css"));
        assert_eq!(css.extension().as_deref(), Some("css"));
    }

    #[test]
    fn sibling_shares_origin_and_directory() {
        let asset = Asset::new("/p/src/js/main.js", "script.js", b"x".to_vec());
        let map = asset.sibling("script.js.map", b"{}".to_vec());
        assert_eq!(map.relative, PathBuf::from("script.js.map"));
        assert_eq!(map.origin, asset.origin);
    }
}
