//! Git fallback: working tree (with index) against HEAD, read through libgit2.

use crate::error::SourceError;
use git2::{DiffFormat, DiffOptions, Repository};
use std::path::Path;
use tracing::debug;

/// Unified diff text of uncommitted changes in the repository containing `dir`.
///
/// Untracked files are included with their content. A repository without
/// commits diffs against the empty tree.
pub fn working_tree_diff(dir: &Path) -> Result<String, SourceError> {
    let repo = Repository::discover(dir).map_err(|_| SourceError::NotARepo(dir.display().to_string()))?;

    let head_tree = match repo.head() {
        Ok(head) => Some(head.peel_to_tree()?),
        Err(_) => None,
    };

    let mut opts = DiffOptions::new();
    opts.include_untracked(true)
        .recurse_untracked_dirs(true)
        .show_untracked_content(true);
    let mut diff = repo.diff_tree_to_workdir_with_index(head_tree.as_ref(), Some(&mut opts))?;
    diff.find_similar(None)?;

    let mut text = String::new();
    let mut invalid_utf8 = false;
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        let Ok(content) = std::str::from_utf8(line.content()) else {
            invalid_utf8 = true;
            return false;
        };
        match line.origin() {
            '+' | '-' | ' ' => text.push(line.origin()),
            _ => {}
        }
        text.push_str(content);
        true
    })
    .or_else(|err| if invalid_utf8 { Ok(()) } else { Err(err) })?;

    if invalid_utf8 {
        return Err(SourceError::InvalidUtf8);
    }
    debug!(bytes = text.len(), "read git working tree diff");
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::parse_unified;
    use crate::models::LineKind;
    use std::fs;
    use std::process::Command;
    use tempfile::TempDir;

    fn create_git_repo() -> TempDir {
        let dir = TempDir::new().unwrap();

        Command::new("git")
            .args(["init"])
            .current_dir(dir.path())
            .output()
            .expect("Failed to init git repo");

        Command::new("git")
            .args(["config", "user.email", "test@test.com"])
            .current_dir(dir.path())
            .output()
            .expect("Failed to configure git email");

        Command::new("git")
            .args(["config", "user.name", "Test User"])
            .current_dir(dir.path())
            .output()
            .expect("Failed to configure git name");

        dir
    }

    fn add_and_commit_file(dir: &TempDir, filename: &str, content: &str) {
        fs::write(dir.path().join(filename), content).unwrap();

        Command::new("git")
            .args(["add", filename])
            .current_dir(dir.path())
            .output()
            .expect("Failed to add file");

        Command::new("git")
            .args(["commit", "-m", "Add file"])
            .current_dir(dir.path())
            .output()
            .expect("Failed to commit");
    }

    #[test]
    fn test_working_tree_diff_no_repo() {
        let dir = TempDir::new().unwrap();
        let result = working_tree_diff(dir.path());
        assert!(matches!(result, Err(SourceError::NotARepo(_))));
    }

    #[test]
    fn test_working_tree_diff_clean_repo() {
        let dir = create_git_repo();
        add_and_commit_file(&dir, "a.txt", "one\n");
        let text = working_tree_diff(dir.path()).unwrap();
        assert!(text.is_empty());
    }

    #[test]
    fn test_working_tree_diff_modified_file_parses() {
        let dir = create_git_repo();
        add_and_commit_file(&dir, "a.rs", "fn a() {}\nfn b() {}\n");
        fs::write(dir.path().join("a.rs"), "fn a() {}\nfn c() {}\n").unwrap();

        let text = working_tree_diff(dir.path()).unwrap();
        let files = parse_unified(&text);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "a.rs");

        let kinds: Vec<LineKind> = files[0].hunks[0].lines.iter().map(|l| l.kind).collect();
        assert!(kinds.contains(&LineKind::Deletion));
        assert!(kinds.contains(&LineKind::Addition));
    }

    #[test]
    fn test_working_tree_diff_untracked_file() {
        let dir = create_git_repo();
        add_and_commit_file(&dir, "a.txt", "a\n");
        fs::write(dir.path().join("new.txt"), "fresh\n").unwrap();

        let text = working_tree_diff(dir.path()).unwrap();
        let files = parse_unified(&text);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "new.txt");
        assert_eq!(files[0].hunks[0].lines[0].content, "fresh");
    }
}
