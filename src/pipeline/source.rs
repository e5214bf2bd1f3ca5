// src/pipeline/source.rs

//! Source resolution: turn a task's `src` glob into the list of files to read.
//!
//! Output paths are computed relative to the pattern's *glob base*, the
//! leading directories before the first segment containing a glob
//! metacharacter:
//!
//! | pattern                  | base             | `src/assets/img/a/b.png` → |
//! |--------------------------|------------------|----------------------------|
//! | `src/assets/img/**/*.*`  | `src/assets/img` | `a/b.png`                  |
//! | `src/index.html`         | `src`            | (literal) `index.html`     |

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use globset::GlobSet;
use tracing::debug;

use crate::errors::{PipelineError, Result};
use crate::fs::FileSystem;
use crate::watch::patterns::{build_globset, strip_dot_slash};

const GLOB_META: &[char] = &['*', '?', '[', ']', '{', '}'];

/// A file selected by a task's source glob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute (project-root joined) path.
    pub path: PathBuf,
    /// Path relative to the glob base; becomes the output path.
    pub relative: PathBuf,
}

/// Split a pattern into its glob base and whether it is a literal path.
pub fn glob_base(pattern: &str) -> (PathBuf, bool) {
    let pattern = strip_dot_slash(pattern);
    let segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();

    match segments.iter().position(|s| s.contains(GLOB_META)) {
        Some(idx) => (segments[..idx].iter().collect(), false),
        None => {
            let base = match segments.split_last() {
                Some((_, dirs)) => dirs.iter().collect(),
                None => PathBuf::new(),
            };
            (base, true)
        }
    }
}

/// Resolve `pattern` (minus `exclude`) below `root`.
///
/// - A literal path that is not an existing file fails with
///   [`PipelineError::SourceNotFound`].
/// - A glob whose base directory is missing, or that matches nothing,
///   resolves to an empty list.
///
/// Results are sorted by path.
pub fn resolve_sources(
    fs: &dyn FileSystem,
    root: &Path,
    task: &str,
    pattern: &str,
    exclude: &[String],
) -> Result<Vec<SourceFile>> {
    let (base, literal) = glob_base(pattern);
    let base_abs = root.join(&base);

    if literal {
        let path = root.join(strip_dot_slash(pattern));
        if !fs.is_file(&path) {
            return Err(PipelineError::SourceNotFound {
                task: task.to_string(),
                path,
            });
        }
        let relative = path
            .strip_prefix(&base_abs)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| PathBuf::from(path.file_name().unwrap_or_default()));
        return Ok(vec![SourceFile { path, relative }]);
    }

    let include = build_globset(&[pattern.to_string()])?;
    let exclude = if exclude.is_empty() {
        None
    } else {
        Some(build_globset(exclude)?)
    };

    if !fs.is_dir(&base_abs) {
        debug!(task, base = ?base_abs, "glob base does not exist; nothing to read");
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    let mut stack = vec![base_abs.clone()];
    // Symlinked directories are followed, but every real directory is read
    // at most once.
    let mut visited = HashSet::new();

    while let Some(dir) = stack.pop() {
        let real = fs.canonicalize(&dir).unwrap_or_else(|_| dir.clone());
        if !visited.insert(real) {
            debug!(task, dir = ?dir, "directory already walked; skipping");
            continue;
        }
        let entries = fs
            .read_dir(&dir)
            .map_err(|e| PipelineError::fs(&dir, e))?;
        for path in entries {
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) && is_selected(root, &path, &include, exclude.as_ref()) {
                let relative = path
                    .strip_prefix(&base_abs)
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|_| path.clone());
                files.push(SourceFile { path, relative });
            }
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    debug!(task, pattern, matched = files.len(), "resolved sources");
    Ok(files)
}

fn is_selected(root: &Path, path: &Path, include: &GlobSet, exclude: Option<&GlobSet>) -> bool {
    let Ok(rel) = path.strip_prefix(root) else {
        return false;
    };
    let rel = rel.to_string_lossy().replace('\\', "/");
    include.is_match(&rel) && !exclude.is_some_and(|set| set.is_match(&rel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;

    #[test]
    fn glob_base_stops_at_first_meta_segment() {
        assert_eq!(glob_base("./src/assets/img/**/*.*"), (PathBuf::from("src/assets/img"), false));
        assert_eq!(glob_base("src/assets/*.*"), (PathBuf::from("src/assets"), false));
        assert_eq!(glob_base("src/js/{a,b}.js"), (PathBuf::from("src/js"), false));
        assert_eq!(glob_base("./src/index.html"), (PathBuf::from("src"), true));
        assert_eq!(glob_base("index.html"), (PathBuf::new(), true));
    }

    fn project() -> MockFileSystem {
        let fs = MockFileSystem::new();
        fs.add_file("/p/src/index.html", "<html></html>");
        fs.add_file("/p/src/assets/favicon.ico", "ico");
        fs.add_file("/p/src/assets/img/logo.png", "png");
        fs.add_file("/p/src/assets/img/icons/menu.svg", "svg");
        fs.add_file("/p/src/assets/img/icons/draft.svg", "svg");
        fs
    }

    #[test]
    fn recursive_glob_keeps_structure_below_base() {
        let fs = project();
        let files = resolve_sources(&fs, Path::new("/p"), "image-task", "src/assets/img/**/*.*", &[])
            .unwrap();
        let rel: Vec<_> = files.iter().map(|f| f.relative.clone()).collect();
        assert_eq!(
            rel,
            vec![
                PathBuf::from("icons/draft.svg"),
                PathBuf::from("icons/menu.svg"),
                PathBuf::from("logo.png"),
            ]
        );
    }

    #[test]
    fn single_level_glob_ignores_subdirectories() {
        let fs = project();
        let files =
            resolve_sources(&fs, Path::new("/p"), "copy-assets", "./src/assets/*.*", &[]).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative, PathBuf::from("favicon.ico"));
    }

    #[test]
    fn exclude_filters_matches() {
        let fs = project();
        let files = resolve_sources(
            &fs,
            Path::new("/p"),
            "image-task",
            "src/assets/img/**/*.svg",
            &["src/**/draft.svg".to_string()],
        )
        .unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative, PathBuf::from("icons/menu.svg"));
    }

    #[test]
    fn literal_path_resolves_relative_to_parent() {
        let fs = project();
        let files =
            resolve_sources(&fs, Path::new("/p"), "html-task", "./src/index.html", &[]).unwrap();
        assert_eq!(files[0].path, PathBuf::from("/p/src/index.html"));
        assert_eq!(files[0].relative, PathBuf::from("index.html"));
    }

    #[test]
    fn missing_literal_path_is_source_not_found() {
        let fs = project();
        let err = resolve_sources(&fs, Path::new("/p"), "js-task", "src/js/main.js", &[])
            .unwrap_err();
        match err {
            PipelineError::SourceNotFound { task, path } => {
                assert_eq!(task, "js-task");
                assert_eq!(path, PathBuf::from("/p/src/js/main.js"));
            }
            other => panic!("expected SourceNotFound, got {other:?}"),
        }
    }

    #[test]
    fn glob_over_missing_directory_is_a_no_op() {
        let fs = project();
        let files =
            resolve_sources(&fs, Path::new("/p"), "fonts-task", "src/assets/fonts/**/*.*", &[])
                .unwrap();
        assert!(files.is_empty());
    }
}
