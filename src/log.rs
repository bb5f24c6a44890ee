//! `jj log` listing for picking which change to view.
//!
//! The log is requested with a template that prefixes every commit with its
//! fields, each followed by `MARKER`, ahead of jj's own compact rendering.
//! A line carrying the full set of markers starts a new commit; any other
//! non-blank line (the description line, elided-revision markers) belongs to
//! the commit above it. The graph gutter jj draws before the template output
//! is kept, so the picker shows the same shape `jj log` would.

use crate::error::SourceError;
use crate::jj;
use std::path::Path;
use tracing::debug;

/// Field separator emitted by the log template
pub const MARKER: &str = "__JJD__";

/// Commits listed when the picker opens
pub const DEFAULT_LIMIT: usize = 200;

/// Parts of a commit's first line once split on `MARKER`: the graph gutter,
/// twelve fields, and jj's compact rendering.
const FIELD_COUNT: usize = 14;

const DESCRIPTION: &str = r#"if(empty, "(empty) ", "") ++ if(description.first_line(), description.first_line(), "(no description set)")"#;
const TIMESTAMP: &str = r#"author.timestamp().local().format("%Y-%m-%d %H:%M:%S %:z")"#;
const BOOKMARKS: &str = r#"bookmarks.map(|b| b.name()).join(",")"#;
const WORKING_COPIES: &str = r#"working_copies.map(|wc| wc.name()).join(",")"#;

/// One commit from `jj log`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Commit {
    pub change_id: String,
    pub commit_id: String,
    pub immutable: bool,
    pub empty: bool,
    pub divergent: bool,
    /// First description line, `(no description set)` when there is none
    pub description: String,
    pub author: String,
    pub author_email: String,
    pub timestamp: String,
    pub bookmarks: Vec<String>,
    pub git_head: bool,
    pub working_copies: Vec<String>,
    /// The graph node is `@`
    pub is_working_copy: bool,
    /// Display lines, graph gutter included
    pub lines: Vec<String>,
}

impl Commit {
    /// Whether `revision` names this commit: `@` for the working copy, an id
    /// prefix, or a bookmark.
    pub fn matches_revision(&self, revision: &str) -> bool {
        if revision == "@" {
            return self.is_working_copy;
        }
        !revision.is_empty()
            && (self.change_id.starts_with(revision)
                || self.commit_id.starts_with(revision)
                || self.bookmarks.iter().any(|b| b == revision))
    }
}

/// A page of the log plus whether more commits exist past the limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogPage {
    pub commits: Vec<Commit>,
    pub has_more: bool,
}

/// Template passed to `jj log --template`.
pub fn log_template() -> String {
    let fields = [
        "change_id.short()",
        "commit_id.short()",
        "immutable",
        "empty",
        "divergent",
        DESCRIPTION,
        "author.name()",
        "author.email()",
        TIMESTAMP,
        BOOKMARKS,
        "git_head",
        WORKING_COPIES,
    ];
    let marker = format!("\"{MARKER}\"");

    let mut parts = vec![marker.clone()];
    for field in fields {
        parts.push(field.to_string());
        parts.push(marker.clone());
    }
    parts.push("builtin_log_compact".to_string());
    parts.join(" ++ ")
}

fn split_list(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(',').map(str::to_string).collect()
}

/// Parse `jj log` output produced with `log_template`.
pub fn parse_log_output(output: &str) -> Vec<Commit> {
    let mut commits = Vec::new();
    let mut current: Option<Commit> = None;

    for line in output.lines() {
        let parts: Vec<&str> = line.split(MARKER).collect();
        if parts.len() >= FIELD_COUNT {
            if let Some(done) = current.take() {
                commits.push(done);
            }
            let gutter = parts[0];
            current = Some(Commit {
                change_id: parts[1].to_string(),
                commit_id: parts[2].to_string(),
                immutable: parts[3] == "true",
                empty: parts[4] == "true",
                divergent: parts[5] == "true",
                description: parts[6].to_string(),
                author: parts[7].to_string(),
                author_email: parts[8].to_string(),
                timestamp: parts[9].to_string(),
                bookmarks: split_list(parts[10]),
                git_head: parts[11] == "true",
                working_copies: split_list(parts[12]),
                is_working_copy: gutter.contains('@'),
                // Extra markers inside the compact rendering stay part of it
                lines: vec![format!("{gutter}{}", parts[13..].join(MARKER))],
            });
            continue;
        }

        if let Some(commit) = current.as_mut() {
            if !line.trim().is_empty() {
                commit.lines.push(line.to_string());
            }
        }
    }

    if let Some(done) = current {
        commits.push(done);
    }
    commits
}

fn log_args<'a>(template: &'a str, revset: Option<&'a str>, limit: &'a str) -> Vec<&'a str> {
    let mut args = vec!["log", "--color", "never", "--template", template];
    if let Some(revset) = revset {
        args.extend(["-r", revset]);
    }
    args.extend(["--limit", limit]);
    args
}

fn is_stale(output: &str) -> bool {
    let output = output.to_lowercase();
    output.contains("working copy is stale") || output.contains("stale working copy")
}

/// Up to `limit` commits of `revset` (jj's default revset when `None`).
pub fn fetch_log(repo: &Path, revset: Option<&str>, limit: usize) -> Result<LogPage, SourceError> {
    let root = jj::repo_root(repo)?;
    let template = log_template();
    // One extra commit tells whether the list was cut short
    let fetch_limit = (limit + 1).to_string();
    let result = jj::execute(&root, &log_args(&template, revset, &fetch_limit))?;

    let combined = format!("{}{}", result.stdout, result.stderr);
    if is_stale(&combined) {
        return Err(SourceError::StaleWorkingCopy(result.stderr.trim().to_string()));
    }
    if !result.success {
        return Err(SourceError::JjFailed {
            code: result.exit_code,
            stderr: result.stderr.trim().to_string(),
        });
    }

    let mut commits = parse_log_output(&result.stdout);
    let has_more = commits.len() > limit;
    commits.truncate(limit);
    debug!(commits = commits.len(), has_more, "jj log parsed");
    Ok(LogPage { commits, has_more })
}

/// Selection state of the log picker.
#[derive(Debug, Clone)]
pub struct LogPicker {
    page: LogPage,
    selected: usize,
}

impl LogPicker {
    /// Open on the commit `revision` names, or the first commit.
    pub fn new(page: LogPage, revision: &str) -> Self {
        let selected = page
            .commits
            .iter()
            .position(|c| c.matches_revision(revision))
            .unwrap_or(0);
        LogPicker { page, selected }
    }

    pub fn commits(&self) -> &[Commit] {
        &self.page.commits
    }

    pub fn has_more(&self) -> bool {
        self.page.has_more
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected(&self) -> Option<&Commit> {
        self.page.commits.get(self.selected)
    }

    /// Move the selection, clamped to the list.
    pub fn move_by(&mut self, delta: isize) {
        let last = self.page.commits.len().saturating_sub(1);
        self.selected = self.selected.saturating_add_signed(delta).min(last);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.page.commits.len().saturating_sub(1);
    }

    /// First display line to draw in `height` rows so the whole selected
    /// commit is on screen (its first line when it is taller than `height`).
    pub fn scroll_for(&self, height: usize) -> usize {
        let start: usize = self.page.commits[..self.selected.min(self.page.commits.len())]
            .iter()
            .map(|c| c.lines.len())
            .sum();
        let len = self.selected().map_or(0, |c| c.lines.len());
        (start + len).saturating_sub(height).min(start)
    }
}
