//! Shared data model for parsed diffs, flattened rows and highlighted tokens.

use crossterm::style::Color;
use std::fmt;

/// Identity of one file within a parsed diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

/// Identity of one hunk, unique across the whole parsed diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HunkId(pub u32);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file#{}", self.0)
    }
}

impl fmt::Display for HunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hunk#{}", self.0)
    }
}

/// Kind of a single line inside a hunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Context,
    Addition,
    Deletion,
}

/// One line of a diff hunk as produced by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: LineKind,
    pub content: String,
    /// Absent for pure additions
    pub old_line: Option<u32>,
    /// Absent for pure deletions
    pub new_line: Option<u32>,
}

/// A contiguous change region within a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub id: HunkId,
    pub old_start: u32,
    pub old_len: u32,
    pub new_start: u32,
    pub new_len: u32,
    pub lines: Vec<DiffLine>,
}

impl Hunk {
    /// First old-side line number after this hunk.
    pub fn old_end(&self) -> u32 {
        self.old_start.saturating_add(self.old_len)
    }

    /// First new-side line number after this hunk.
    pub fn new_end(&self) -> u32 {
        self.new_start.saturating_add(self.new_len)
    }
}

/// One file's diff: display name plus hunks ordered by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenedFile {
    pub id: FileId,
    pub name: String,
    pub hunks: Vec<Hunk>,
}

/// Kind of a renderable row in the flattened view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    FileHeader,
    FileGap,
    Gap,
    Context,
    Addition,
    Deletion,
}

impl RowKind {
    /// Header and gap rows are synthetic; they carry no diff line.
    pub fn is_structural(self) -> bool {
        matches!(self, RowKind::FileHeader | RowKind::FileGap | RowKind::Gap)
    }
}

impl From<LineKind> for RowKind {
    fn from(kind: LineKind) -> Self {
        match kind {
            LineKind::Context => RowKind::Context,
            LineKind::Addition => RowKind::Addition,
            LineKind::Deletion => RowKind::Deletion,
        }
    }
}

/// Which side of a split view a content row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// One renderable line in the flattened view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffRow {
    pub kind: RowKind,
    pub content: String,
    pub file_id: FileId,
    /// Absent for header and gap rows
    pub hunk_id: Option<HunkId>,
    pub old_line: Option<u32>,
    pub new_line: Option<u32>,
    pub side: Option<Side>,
    pub row_index: usize,
    pub file_name: String,
    /// Number of collapsed unchanged lines, set only on `Gap` rows
    pub gap_lines: Option<u32>,
}

/// One highlighted segment of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSpan {
    pub content: String,
    pub color: Option<Color>,
}

impl TokenSpan {
    /// Unstyled span covering `content`.
    pub fn plain(content: &str) -> Self {
        TokenSpan {
            content: content.to_string(),
            color: None,
        }
    }
}

/// Concatenate span contents back into the line they were produced from.
pub fn spans_text(spans: &[TokenSpan]) -> String {
    spans.iter().map(|s| s.content.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hunk_end_positions() {
        let hunk = Hunk {
            id: HunkId(0),
            old_start: 10,
            old_len: 4,
            new_start: 12,
            new_len: 6,
            lines: Vec::new(),
        };
        assert_eq!(hunk.old_end(), 14);
        assert_eq!(hunk.new_end(), 18);
    }

    #[test]
    fn test_hunk_end_saturates() {
        let hunk = Hunk {
            id: HunkId(0),
            old_start: u32::MAX - 1,
            old_len: 5,
            new_start: u32::MAX,
            new_len: u32::MAX,
            lines: Vec::new(),
        };
        assert_eq!(hunk.old_end(), u32::MAX);
        assert_eq!(hunk.new_end(), u32::MAX);
    }

    #[test]
    fn test_structural_row_kinds() {
        assert!(RowKind::FileHeader.is_structural());
        assert!(RowKind::FileGap.is_structural());
        assert!(RowKind::Gap.is_structural());
        assert!(!RowKind::Context.is_structural());
        assert!(!RowKind::Addition.is_structural());
        assert!(!RowKind::Deletion.is_structural());
    }

    #[test]
    fn test_spans_text_concatenates() {
        let spans = vec![
            TokenSpan::plain("let "),
            TokenSpan {
                content: "x".to_string(),
                color: Some(Color::Red),
            },
        ];
        assert_eq!(spans_text(&spans), "let x");
    }
}
