//! Error types for diff retrieval and highlighter setup.

use std::io;
use thiserror::Error;

/// Failures while retrieving diff text from jj, git or a file.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("jj executable not found in PATH")]
    JjNotFound,

    #[error("jj exited with status {code}: {stderr}")]
    JjFailed { code: i32, stderr: String },

    #[error("The working copy is stale: {0}")]
    StaleWorkingCopy(String),

    #[error("Not a repository: {0}")]
    NotARepo(String),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Diff output is not valid UTF-8")]
    InvalidUtf8,
}

/// Failures while loading grammars or the color theme in the tokenization worker.
#[derive(Debug, Error)]
pub enum WorkerInitError {
    #[error("failed to load syntax definitions: {0}")]
    Syntax(#[from] syntect::LoadingError),

    #[error("invalid theme scope selector: {0}")]
    Scope(#[from] syntect::parsing::ParseScopeError),

    #[error("syntax directory {0} does not exist")]
    MissingSyntaxDir(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jj_failed_message() {
        let err = SourceError::JjFailed {
            code: 1,
            stderr: "Error: Revision `nope` doesn't exist".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "jj exited with status 1: Error: Revision `nope` doesn't exist"
        );
    }

    #[test]
    fn test_stale_working_copy_message() {
        let err = SourceError::StaleWorkingCopy("run `jj workspace update-stale`".to_string());
        assert_eq!(err.to_string(), "The working copy is stale: run `jj workspace update-stale`");
    }

    #[test]
    fn test_io_error_converts() {
        let err: SourceError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, SourceError::Io(_)));
    }

    #[test]
    fn test_missing_syntax_dir_message() {
        let err = WorkerInitError::MissingSyntaxDir("/nope".to_string());
        assert_eq!(err.to_string(), "syntax directory /nope does not exist");
    }
}
