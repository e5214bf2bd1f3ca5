// src/watch/hash.rs

//! Content hashing for `use_hash` watch rules.
//!
//! Editors frequently emit write events without changing a file (save
//! without edits, touch, atomic-rename dances). Rules with `use_hash` only
//! fire when the file's blake3 digest differs from the last one seen.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use blake3::Hasher;
use tracing::debug;

use crate::fs::FileSystem;

/// Hex blake3 digest of `bytes`.
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize().to_hex().to_string()
}

/// Last seen digest per watched path. Memory only; a restart re-hashes.
#[derive(Debug, Default, Clone)]
pub struct ContentHashes {
    seen: HashMap<PathBuf, String>,
}

impl ContentHashes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `path` changed since it was last checked.
    ///
    /// The first check of a path counts as a change. A path that cannot be
    /// read (e.g. it was removed) counts as a change and is forgotten.
    pub fn changed(&mut self, fs: &dyn FileSystem, path: &Path) -> bool {
        let bytes = match fs.read(path) {
            Ok(b) => b,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "unreadable; treating as changed");
                self.seen.remove(path);
                return true;
            }
        };

        let digest = hash_bytes(&bytes);
        match self.seen.insert(path.to_path_buf(), digest.clone()) {
            Some(previous) if previous == digest => {
                debug!(path = %path.display(), "content unchanged");
                false
            }
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;

    #[test]
    fn identical_rewrite_is_not_a_change() {
        let fs = MockFileSystem::new();
        let path = Path::new("/p/src/index.html");
        fs.add_file(path, b"<h1>hi</h1>");

        let mut hashes = ContentHashes::new();
        assert!(hashes.changed(&fs, path));
        assert!(!hashes.changed(&fs, path));

        fs.add_file(path, b"<h1>hello</h1>");
        assert!(hashes.changed(&fs, path));
    }

    #[test]
    fn removed_file_counts_as_change() {
        let fs = MockFileSystem::new();
        let mut hashes = ContentHashes::new();
        assert!(hashes.changed(&fs, Path::new("/p/src/gone.js")));
    }
}
