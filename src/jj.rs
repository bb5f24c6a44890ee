//! Thin wrapper over the `jj` command line.
//!
//! All repository access goes through the external CLI; nothing here
//! mutates the repository.

use crate::error::SourceError;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;
use tracing::{debug, info};

/// Captured output of one `jj` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub success: bool,
}

/// Run `jj <args>` in `repo`.
///
/// Editors are disabled so jj can never block on an interactive prompt, and
/// stdin is closed.
pub fn execute(repo: &Path, args: &[&str]) -> Result<ExecuteResult, SourceError> {
    let started = Instant::now();
    let output = Command::new("jj")
        .args(args)
        .current_dir(repo)
        .env("JJ_EDITOR", "true")
        .env("EDITOR", "true")
        .env("VISUAL", "true")
        .stdin(Stdio::null())
        .output()
        .map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => SourceError::JjNotFound,
            _ => SourceError::Io(err),
        })?;

    let exit_code = output.status.code().unwrap_or(-1);
    info!(
        ?args,
        exit_code,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "jj finished"
    );

    Ok(ExecuteResult {
        stdout: String::from_utf8(output.stdout).map_err(|_| SourceError::InvalidUtf8)?,
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code,
        success: output.status.success(),
    })
}

/// Stdout of a successful `jj` call, or `JjFailed` with its stderr.
fn output(repo: &Path, args: &[&str]) -> Result<String, SourceError> {
    let result = execute(repo, args)?;
    if !result.success {
        return Err(SourceError::JjFailed {
            code: result.exit_code,
            stderr: result.stderr.trim().to_string(),
        });
    }
    Ok(result.stdout)
}

/// Root of the jj workspace containing `dir`.
pub fn repo_root(dir: &Path) -> Result<PathBuf, SourceError> {
    match output(dir, &["root", "--color", "never"]) {
        Ok(stdout) => Ok(PathBuf::from(stdout.trim())),
        Err(SourceError::JjFailed { .. }) => Err(SourceError::NotARepo(dir.display().to_string())),
        Err(err) => Err(err),
    }
}

/// Git-format diff of `revision`.
pub fn diff_text(repo: &Path, revision: &str) -> Result<String, SourceError> {
    debug!(revision, "fetching jj diff");
    output(repo, &diff_args(revision))
}

fn diff_args(revision: &str) -> [&str; 6] {
    ["diff", "--git", "--color", "never", "-r", revision]
}
