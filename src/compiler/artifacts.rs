//! Ledger of outputs a compiler has written.
//!
//! Each compiler owns one ledger. Recorded files belong to that compiler
//! alone and are deleted unconditionally. Recorded directories may be
//! shared with other outputs (a post's `img/` next to copied `img/*.png`),
//! so they only go once they are empty.

use crate::{
    error::Result,
    utils::fs::{remove_dir_if_empty, remove_if_exists},
};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// A single output file, e.g. `public/style.css`
    File(PathBuf),
    /// A directory created for outputs, e.g. `public/hello/`
    Dir(PathBuf),
}

#[derive(Debug, Default)]
pub struct CreatedArtifacts {
    entries: Vec<Artifact>,
}

impl CreatedArtifacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_file(&mut self, path: impl Into<PathBuf>) {
        self.record(Artifact::File(path.into()));
    }

    pub fn record_dir(&mut self, path: impl Into<PathBuf>) {
        self.record(Artifact::Dir(path.into()));
    }

    fn record(&mut self, artifact: Artifact) {
        // recompiling the same source records the same output again
        if !self.entries.contains(&artifact) {
            self.entries.push(artifact);
        }
    }

    /// Delete every recorded output and forget it.
    ///
    /// Files go first, then directories left empty by them. Outputs that are
    /// already gone are skipped. On error the ledger is left intact so a
    /// retry deletes whatever remains.
    pub fn remove_all(&mut self) -> Result<()> {
        for artifact in &self.entries {
            if let Artifact::File(path) = artifact {
                remove_if_exists(path)?;
            }
        }
        for artifact in self.entries.iter().rev() {
            if let Artifact::Dir(path) = artifact {
                remove_dir_if_empty(path)?;
            }
        }
        self.entries.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::fs::write_file_with_path;
    use std::path::Path;
    use tempfile::TempDir;

    fn sample(dir: &Path) -> CreatedArtifacts {
        write_file_with_path(&dir.join("style.css"), "a{}").unwrap();
        write_file_with_path(&dir.join("hello/index.html"), "<p>").unwrap();

        let mut ledger = CreatedArtifacts::new();
        ledger.record_file(dir.join("style.css"));
        ledger.record_file(dir.join("hello/index.html"));
        ledger.record_dir(dir.join("hello"));
        ledger
    }

    #[test]
    fn test_remove_all_deletes_files_and_dirs() {
        let dir = TempDir::new().unwrap();
        let mut ledger = sample(dir.path());

        ledger.remove_all().unwrap();

        assert!(!dir.path().join("style.css").exists());
        assert!(!dir.path().join("hello").exists());
        assert!(ledger.entries.is_empty());
    }

    #[test]
    fn test_remove_all_twice() {
        let dir = TempDir::new().unwrap();
        let mut ledger = sample(dir.path());

        ledger.remove_all().unwrap();
        let after_first: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        ledger.remove_all().unwrap();
        let after_second: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();

        assert_eq!(after_first.len(), after_second.len());
    }

    #[test]
    fn test_remove_all_tolerates_already_deleted() {
        let dir = TempDir::new().unwrap();
        let mut ledger = sample(dir.path());
        std::fs::remove_dir_all(dir.path().join("hello")).unwrap();

        assert!(ledger.remove_all().is_ok());
    }

    #[test]
    fn test_remove_all_leaves_unrecorded_outputs() {
        let dir = TempDir::new().unwrap();
        let mut ledger = sample(dir.path());
        write_file_with_path(&dir.path().join("logo.png"), "png").unwrap();

        ledger.remove_all().unwrap();
        assert!(dir.path().join("logo.png").exists());
    }

    #[test]
    fn test_shared_dir_keeps_foreign_files() {
        let dir = TempDir::new().unwrap();
        let mut ledger = sample(dir.path());
        write_file_with_path(&dir.path().join("hello/logo.png"), "png").unwrap();

        ledger.remove_all().unwrap();

        assert!(!dir.path().join("hello/index.html").exists());
        assert!(dir.path().join("hello/logo.png").exists());
        assert!(ledger.entries.is_empty());
    }

    #[test]
    fn test_record_deduplicates() {
        let mut ledger = CreatedArtifacts::new();
        ledger.record_file("public/a.css");
        ledger.record_file("public/a.css");
        ledger.record_dir("public/a.css");
        assert_eq!(
            ledger.entries,
            [
                Artifact::File("public/a.css".into()),
                Artifact::Dir("public/a.css".into()),
            ]
        );
    }
}
