//! Content signatures for change detection.
//!
//! Editors often report one save as several events (write a temp file,
//! rename it over the original, touch metadata). Comparing a content hash
//! against the last one seen turns those into at most one real change.
//!
//! | Last seen | Now               | Change? |
//! |-----------|-------------------|---------|
//! | never     | exists (any size) | yes     |
//! | hash `h`  | hash `h`          | no      |
//! | hash `h`  | hash `h'`         | yes     |
//! | hash `h`  | missing           | yes, key dropped |
//! | never     | missing           | no      |

use crate::error::{Error, Result};
use rustc_hash::FxHashMap;
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

#[derive(Debug, Default)]
pub struct FileSignatureStore {
    hashes: FxHashMap<PathBuf, blake3::Hash>,
}

impl FileSignatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current signature of `path` without reporting a change.
    pub fn record(&mut self, path: &Path) -> Result<()> {
        self.has_changed(path).map(|_| ())
    }

    /// Compare `path` against its last recorded signature and update it.
    pub fn has_changed(&mut self, path: &Path) -> Result<bool> {
        match fs::read(path) {
            Ok(bytes) => {
                let hash = blake3::hash(&bytes);
                Ok(self.hashes.insert(path.to_path_buf(), hash) != Some(hash))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(self.hashes.remove(path).is_some()),
            Err(err) => Err(Error::io(path, err)),
        }
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_first_sight_is_change() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.md");
        fs::write(&path, "x").unwrap();

        let mut store = FileSignatureStore::new();
        assert!(store.has_changed(&path).unwrap());
        assert!(!store.has_changed(&path).unwrap());
    }

    #[test]
    fn test_empty_file_differs_from_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.md");
        let mut store = FileSignatureStore::new();

        assert!(!store.has_changed(&path).unwrap());
        assert!(!store.hashes.contains_key(&path));

        fs::write(&path, "").unwrap();
        assert!(store.has_changed(&path).unwrap());
        assert!(store.hashes.contains_key(&path));
        assert!(!store.has_changed(&path).unwrap());
    }

    #[test]
    fn test_content_change() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.md");
        fs::write(&path, "one").unwrap();
        let mut store = FileSignatureStore::new();
        store.record(&path).unwrap();

        fs::write(&path, "two").unwrap();
        assert!(store.has_changed(&path).unwrap());
        fs::write(&path, "two").unwrap();
        assert!(!store.has_changed(&path).unwrap());
    }

    #[test]
    fn test_deletion_is_change_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.md");
        fs::write(&path, "x").unwrap();
        let mut store = FileSignatureStore::new();
        store.record(&path).unwrap();

        fs::remove_file(&path).unwrap();
        assert!(store.has_changed(&path).unwrap());
        assert!(!store.hashes.contains_key(&path));
        assert!(!store.has_changed(&path).unwrap());
    }

    #[test]
    fn test_recreated_file_is_change() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.md");
        fs::write(&path, "x").unwrap();
        let mut store = FileSignatureStore::new();
        store.record(&path).unwrap();

        fs::remove_file(&path).unwrap();
        store.has_changed(&path).unwrap();
        fs::write(&path, "x").unwrap();
        assert!(store.has_changed(&path).unwrap());
    }

    #[test]
    fn test_directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        let mut store = FileSignatureStore::new();
        assert!(matches!(store.has_changed(dir.path()), Err(Error::Io { .. })));
    }
}
