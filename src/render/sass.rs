//! Stylesheet preprocessing through an external command.

use crate::{error::CompileError, utils::exec};
use std::{fs, path::Path};

/// Compile the stylesheet at `src` with `command`.
///
/// The command runs in the stylesheet's directory so relative `@import`s
/// resolve the same way they would from the command line.
pub fn render(src: &Path, command: &[String]) -> Result<Vec<u8>, CompileError> {
    let input = fs::read(src)?;
    let cwd = src.parent().unwrap_or(Path::new("."));
    exec::pipe_through(cwd, command, &input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_render_with_cat() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("style.scss");
        fs::write(&src, "a { b: c }").unwrap();

        let css = render(&src, &["cat".to_owned()]).unwrap();
        assert_eq!(css, b"a { b: c }");
    }

    #[test]
    fn test_render_runs_in_source_dir() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("style.scss");
        fs::write(&src, "").unwrap();
        fs::write(dir.path().join("_partial.scss"), "imported").unwrap();

        let command = ["cat".to_owned(), "_partial.scss".to_owned()];
        assert_eq!(render(&src, &command).unwrap(), b"imported");
    }

    #[test]
    fn test_render_missing_source() {
        let err = render(Path::new("/definitely/not/here.scss"), &["cat".to_owned()]);
        assert!(matches!(err, Err(CompileError::Io(_))));
    }
}
