//! Filesystem helpers shared by compilers and the dispatcher.
//!
//! Removal helpers treat "not found" as success so cleanup can be repeated
//! or run out of order.

use crate::error::{Error, Result};
use std::{
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Write `content` to `path`, creating parent directories as needed.
pub fn write_file_with_path(path: &Path, content: impl AsRef<[u8]>) -> Result<()> {
    create_parent_dirs(path)?;
    fs::write(path, content).map_err(|err| Error::io(path, err))
}

/// Copy `src` to `dest`, overwriting, creating parent directories as needed.
pub fn copy_file(src: &Path, dest: &Path) -> Result<()> {
    create_parent_dirs(dest)?;
    fs::copy(src, dest).map_err(|err| Error::io(src, err))?;
    Ok(())
}

fn create_parent_dirs(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|err| Error::io(parent, err))
        }
        _ => Ok(()),
    }
}

/// Remove a file; a missing file is not an error.
pub fn remove_if_exists(path: &Path) -> Result<()> {
    ignore_not_found(fs::remove_file(path)).map_err(|err| Error::io(path, err))
}

/// Remove a directory once nothing is left in it; a missing or non-empty
/// directory is not an error.
pub fn remove_dir_if_empty(path: &Path) -> Result<()> {
    let is_empty = match fs::read_dir(path) {
        Ok(mut entries) => entries.next().is_none(),
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(Error::io(path, err)),
    };
    if is_empty {
        ignore_not_found(fs::remove_dir(path)).map_err(|err| Error::io(path, err))?;
    }
    Ok(())
}

fn ignore_not_found(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Remove every empty directory below `root`, deepest first.
/// `root` itself is kept.
pub fn remove_empty_dirs(root: &Path) -> Result<()> {
    if !root.is_dir() {
        return Ok(());
    }

    let dirs: Vec<PathBuf> = WalkDir::new(root)
        .min_depth(1)
        .contents_first(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir())
        .map(walkdir::DirEntry::into_path)
        .collect();

    for dir in dirs {
        let is_empty = fs::read_dir(&dir)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if is_empty {
            ignore_not_found(fs::remove_dir(&dir)).map_err(|err| Error::io(&dir, err))?;
        }
    }
    Ok(())
}

/// Map `src` under `src_root` to the same relative location under `dest_root`.
pub fn mirror_path(src: &Path, src_root: &Path, dest_root: &Path) -> PathBuf {
    dest_root.join(src.strip_prefix(src_root).unwrap_or(src))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_file_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/c.txt");
        write_file_with_path(&path, "hi").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "hi");
    }

    #[test]
    fn test_copy_file_overwrites() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src.txt");
        let dest = dir.path().join("out/dest.txt");
        fs::write(&src, "new").unwrap();
        write_file_with_path(&dest, "old content").unwrap();

        copy_file(&src, &dest).unwrap();
        assert_eq!(fs::read_to_string(dest).unwrap(), "new");
    }

    #[test]
    fn test_remove_if_exists_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.css");
        fs::write(&path, "").unwrap();

        remove_if_exists(&path).unwrap();
        remove_if_exists(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_remove_dir_if_empty() {
        let dir = TempDir::new().unwrap();
        let empty = dir.path().join("hello");
        let full = dir.path().join("img");
        fs::create_dir_all(&empty).unwrap();
        write_file_with_path(&full.join("logo.png"), "png").unwrap();

        remove_dir_if_empty(&empty).unwrap();
        remove_dir_if_empty(&empty).unwrap();
        remove_dir_if_empty(&full).unwrap();

        assert!(!empty.exists());
        assert!(full.join("logo.png").exists());
    }

    #[test]
    fn test_remove_if_exists_propagates_other_errors() {
        let dir = TempDir::new().unwrap();
        // removing a directory with remove_file is not NotFound
        assert!(remove_if_exists(dir.path()).is_err());
    }

    #[test]
    fn test_remove_empty_dirs_keeps_files_and_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("empty/nested")).unwrap();
        write_file_with_path(&root.join("full/index.html"), "x").unwrap();

        remove_empty_dirs(root).unwrap();

        assert!(root.exists());
        assert!(!root.join("empty").exists());
        assert!(root.join("full/index.html").exists());
    }

    #[test]
    fn test_remove_empty_dirs_missing_root() {
        assert!(remove_empty_dirs(Path::new("/definitely/not/here")).is_ok());
    }

    #[test]
    fn test_mirror_path() {
        let dest = mirror_path(
            Path::new("/site/source/img/a.png"),
            Path::new("/site/source"),
            Path::new("/site/public"),
        );
        assert_eq!(dest, PathBuf::from("/site/public/img/a.png"));
    }
}
