//! External command execution.
//!
//! Renderers that shell out (the sass compiler) pipe a source file through a
//! configured command: bytes go in on stdin, stdout is the result.

use crate::{error::CompileError, log};
use std::{
    io::Write,
    path::Path,
    process::{Command, Output, Stdio},
    thread,
};

/// Check that the first element of `command` resolves on `PATH`.
pub fn check_command_installed(command: &[String]) -> Result<(), CompileError> {
    let name = command
        .first()
        .ok_or_else(|| CompileError::CommandNotFound(String::new()))?;
    which::which(name).map_err(|_| CompileError::CommandNotFound(name.clone()))?;
    Ok(())
}

/// Run `command` in `cwd`, writing `input` to its stdin and returning stdout.
///
/// Non-empty stderr of a successful run is logged under the command's name.
pub fn pipe_through(cwd: &Path, command: &[String], input: &[u8]) -> Result<Vec<u8>, CompileError> {
    check_command_installed(command)?;
    let name = &command[0];

    let mut child = Command::new(name)
        .args(&command[1..])
        .current_dir(cwd)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    // Feed stdin from another thread so a child filling its stdout pipe
    // cannot deadlock against us.
    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| CompileError::CommandNotFound(name.clone()))?;
    let input = input.to_vec();
    let writer = thread::spawn(move || stdin.write_all(&input));

    let output = child.wait_with_output()?;
    // A child may exit without reading all of stdin; that is its business.
    let _ = writer.join();

    check_output(name, output)
}

fn check_output(name: &str, output: Output) -> Result<Vec<u8>, CompileError> {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();

    if !output.status.success() {
        return Err(CompileError::Command {
            command: name.to_owned(),
            stderr: stderr.to_owned(),
        });
    }

    if !stderr.is_empty() {
        log!(name; "{stderr}");
    }
    Ok(output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cmd(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_check_command_missing() {
        let result = check_command_installed(&cmd(&["definitely-not-a-real-command-xyz"]));
        assert!(matches!(result, Err(CompileError::CommandNotFound(_))));
    }

    #[test]
    fn test_check_command_empty() {
        assert!(check_command_installed(&[]).is_err());
    }

    #[test]
    fn test_pipe_through_cat() {
        let dir = TempDir::new().unwrap();
        let out = pipe_through(dir.path(), &cmd(&["cat"]), b"body { color: red }").unwrap();
        assert_eq!(out, b"body { color: red }");
    }

    #[test]
    fn test_pipe_through_large_input() {
        let dir = TempDir::new().unwrap();
        let input = vec![b'a'; 1 << 20];
        let out = pipe_through(dir.path(), &cmd(&["cat"]), &input).unwrap();
        assert_eq!(out.len(), input.len());
    }

    #[test]
    fn test_pipe_through_failure_reports_command() {
        let dir = TempDir::new().unwrap();
        let err = pipe_through(dir.path(), &cmd(&["false"]), b"").unwrap_err();
        assert!(matches!(err, CompileError::Command { ref command, .. } if command == "false"));
    }
}
