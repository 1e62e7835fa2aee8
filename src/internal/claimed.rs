use std::collections::HashMap;
use std::path::{Path, PathBuf};

// ========================================================================= //

/// The output paths written so far during one extraction.
///
/// Paths are compared case-insensitively, the way Windows compares file
/// names, so `README.TXT` and `readme.txt` in the same directory collide on
/// every platform and the second one never silently replaces the first.
#[derive(Debug, Default)]
pub(crate) struct ClaimedPaths {
    paths: HashMap<String, PathBuf>,
}

impl ClaimedPaths {
    pub(crate) fn new() -> ClaimedPaths {
        ClaimedPaths::default()
    }

    /// Returns true if a path equal to `path`, ignoring case, was claimed.
    pub(crate) fn contains(&self, path: &Path) -> bool {
        self.paths.contains_key(&fold(path))
    }

    /// Returns the spelling under which a path equal to `path`, ignoring
    /// case, was first claimed.
    pub(crate) fn get(&self, path: &Path) -> Option<&Path> {
        self.paths.get(&fold(path)).map(PathBuf::as_path)
    }

    /// Claims `path`.  Returns false if it was already claimed, in which case
    /// the earlier spelling is kept.
    pub(crate) fn insert(&mut self, path: PathBuf) -> bool {
        let key = fold(&path);
        if self.paths.contains_key(&key) {
            return false;
        }
        self.paths.insert(key, path);
        true
    }
}

fn fold(path: &Path) -> String {
    path.to_string_lossy().to_lowercase()
}

// ========================================================================= //


// ========================================================================= //
