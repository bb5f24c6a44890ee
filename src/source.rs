//! Where the diff text comes from.

use crate::error::SourceError;
use crate::{git, jj};
use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffSource {
    Jj { repo: PathBuf, revision: String },
    Git { repo: PathBuf },
    File(PathBuf),
    Stdin,
}

impl DiffSource {
    /// Fetch the current diff text. Called again on reload.
    pub fn load(&self) -> Result<String, SourceError> {
        match self {
            DiffSource::Jj { repo, revision } => {
                let root = jj::repo_root(repo)?;
                jj::diff_text(&root, revision)
            }
            DiffSource::Git { repo } => git::working_tree_diff(repo),
            DiffSource::File(path) => Ok(fs::read_to_string(path)?),
            DiffSource::Stdin => {
                let mut text = String::new();
                io::stdin().read_to_string(&mut text)?;
                Ok(text)
            }
        }
    }

    /// Stdin can only be read once.
    pub fn can_reload(&self) -> bool {
        !matches!(self, DiffSource::Stdin)
    }
}

impl fmt::Display for DiffSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffSource::Jj { revision, .. } => write!(f, "jj {revision}"),
            DiffSource::Git { .. } => write!(f, "git working tree"),
            DiffSource::File(path) => write!(f, "{}", path.display()),
            DiffSource::Stdin => write!(f, "stdin"),
        }
    }
}
