//! Disposal of a command's output: redirection targets or the terminal.

use crate::command::CommandResult;
use crate::error::ShellError;
use anyhow::Result;
use log::debug;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Send both streams of `result` where they belong.
///
/// A stream with a target is written to that file (relative targets resolve
/// against `current_dir`), creating missing parent directories and replacing
/// any previous content. This happens whatever the exit code, and an empty
/// stream still leaves an empty file behind. A stream without a target goes
/// to its terminal writer with a trailing newline, unless it is empty.
///
/// When both targets name the same file, however they are spelled, it
/// receives stdout, then stderr.
pub fn route(
    result: &CommandResult,
    stdout_target: Option<&str>,
    stderr_target: Option<&str>,
    current_dir: &Path,
    term_out: &mut dyn Write,
    term_err: &mut dyn Write,
) -> Result<()> {
    let stdout_path = stdout_target
        .map(|target| prepare_target(&current_dir.join(target)))
        .transpose()?;
    let stderr_path = stderr_target
        .map(|target| prepare_target(&current_dir.join(target)))
        .transpose()?;

    if let (Some(out), Some(err)) = (&stdout_path, &stderr_path) {
        if out == err {
            let combined = match (result.stdout.is_empty(), result.stderr.is_empty()) {
                (false, false) => format!("{}\n{}", result.stdout, result.stderr),
                _ => format!("{}{}", result.stdout, result.stderr),
            };
            return write_target(out, &combined);
        }
    }

    match &stdout_path {
        Some(path) => write_target(path, &result.stdout)?,
        None => print_stream(term_out, &result.stdout)?,
    }
    match &stderr_path {
        Some(path) => write_target(path, &result.stderr)?,
        None => print_stream(term_err, &result.stderr)?,
    }
    Ok(())
}

/// Create the parent directories of `path` and return the location it
/// really names: symlinks and `..` resolved, whether the file exists yet or not.
fn prepare_target(path: &Path) -> Result<PathBuf> {
    let redirect_error = |source| ShellError::Redirect {
        path: path.to_path_buf(),
        source,
    };
    let (Some(parent), Some(file_name)) = (path.parent(), path.file_name()) else {
        return Ok(path.to_path_buf());
    };
    fs::create_dir_all(parent).map_err(redirect_error)?;
    match fs::canonicalize(path) {
        Ok(existing) => Ok(existing),
        Err(_) => Ok(fs::canonicalize(parent)
            .map_err(redirect_error)?
            .join(file_name)),
    }
}

fn write_target(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|source| ShellError::Redirect {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

fn print_stream(out: &mut dyn Write, content: &str) -> Result<()> {
    if !content.is_empty() {
        writeln!(out, "{}", content)?;
        out.flush()?;
    }
    Ok(())
}
