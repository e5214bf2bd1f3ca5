// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::path::Path;

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (e.g. due to symlinks or different absolute prefixes),
///   we canonicalize both paths and try again.
///
/// Returns `None` if the path cannot be related to `root`. Paths of removed
/// files cannot be canonicalized, so only the fast path applies to them.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(rel.to_string_lossy().replace('\\', "/"));
    }

    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(rel.to_string_lossy().replace('\\', "/"));
        }
    }

    None
}

/// Editor swap/backup files and similar artifacts.
pub fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "swx" | "tmp")
        || name.ends_with('~')
        || name.starts_with(".#")
        || name == "4913"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_uses_forward_slashes() {
        let rel = relative_str(Path::new("/p"), Path::new("/p/src/assets/js/main.js"));
        assert_eq!(rel.as_deref(), Some("src/assets/js/main.js"));
        assert_eq!(relative_str(Path::new("/p"), Path::new("/elsewhere/x")), None);
    }

    #[test]
    fn editor_artifacts_are_temp_files() {
        assert!(is_temp_file(Path::new("src/.style.scss.swp")));
        assert!(is_temp_file(Path::new("src/index.html~")));
        assert!(is_temp_file(Path::new("src/.#index.html")));
        assert!(is_temp_file(Path::new("src/4913")));
        assert!(!is_temp_file(Path::new("src/assets/sass/_vars.scss")));
        assert!(!is_temp_file(Path::new("src/.htaccess")));
    }
}
