//! Parser for git-format unified diffs, as printed by `jj diff --git` and
//! `git diff`. Produces the files → hunks → lines structure that the row
//! flattener consumes.

use crate::models::{DiffLine, FileId, FlattenedFile, Hunk, HunkId, LineKind};

const DEV_NULL: &str = "/dev/null";

/// Header of a hunk: `@@ -old_start,old_len +new_start,new_len @@`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkHeader {
    pub old_start: u32,
    pub old_len: u32,
    pub new_start: u32,
    pub new_len: u32,
}

#[derive(Default)]
struct FileBuilder {
    header_old: Option<String>,
    header_new: Option<String>,
    old_path: Option<String>,
    new_path: Option<String>,
    rename_from: Option<String>,
    rename_to: Option<String>,
    hunks: Vec<Hunk>,
}

impl FileBuilder {
    fn display_name(&self) -> String {
        if let (Some(from), Some(to)) = (&self.rename_from, &self.rename_to) {
            return format!("{from} → {to}");
        }
        self.new_path
            .clone()
            .or_else(|| self.old_path.clone())
            .or_else(|| self.header_new.clone())
            .or_else(|| self.header_old.clone())
            .unwrap_or_default()
    }

    fn finish(self, id: FileId) -> FlattenedFile {
        FlattenedFile {
            id,
            name: self.display_name(),
            hunks: self.hunks,
        }
    }
}

/// Hunk being filled, with the lines still expected on each side
struct OpenHunk {
    hunk: Hunk,
    old_next: u32,
    new_next: u32,
    old_remaining: u32,
    new_remaining: u32,
}

impl OpenHunk {
    fn is_complete(&self) -> bool {
        self.old_remaining == 0 && self.new_remaining == 0
    }

    fn push(&mut self, kind: LineKind, content: &str) {
        let (old_line, new_line) = match kind {
            LineKind::Context => (Some(self.old_next), Some(self.new_next)),
            LineKind::Deletion => (Some(self.old_next), None),
            LineKind::Addition => (None, Some(self.new_next)),
        };
        if old_line.is_some() {
            self.old_next = self.old_next.saturating_add(1);
            self.old_remaining = self.old_remaining.saturating_sub(1);
        }
        if new_line.is_some() {
            self.new_next = self.new_next.saturating_add(1);
            self.new_remaining = self.new_remaining.saturating_sub(1);
        }
        self.hunk.lines.push(DiffLine {
            kind,
            content: content.to_string(),
            old_line,
            new_line,
        });
    }
}

/// Parse unified diff text into files. Text before the first `diff --git`
/// line is ignored; binary and mode-only changes yield files without hunks.
pub fn parse_unified(text: &str) -> Vec<FlattenedFile> {
    let mut files = Vec::new();
    let mut current: Option<FileBuilder> = None;
    let mut open: Option<OpenHunk> = None;
    let mut next_hunk_id = 0u32;

    for raw in text.lines() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);

        if let Some(rest) = line.strip_prefix("diff --git ") {
            close_hunk(&mut current, &mut open);
            if let Some(file) = current.take() {
                files.push(file.finish(FileId(files.len() as u32)));
            }
            let (header_old, header_new) = split_git_header(rest);
            current = Some(FileBuilder {
                header_old,
                header_new,
                ..FileBuilder::default()
            });
            continue;
        }

        let Some(file) = current.as_mut() else {
            continue;
        };

        // Hunk body lines, while the header's line counts are not used up
        if let Some(hunk) = open.as_mut().filter(|h| !h.is_complete()) {
            match line.chars().next() {
                Some(' ') => {
                    hunk.push(LineKind::Context, &line[1..]);
                    continue;
                }
                Some('+') => {
                    hunk.push(LineKind::Addition, &line[1..]);
                    continue;
                }
                Some('-') => {
                    hunk.push(LineKind::Deletion, &line[1..]);
                    continue;
                }
                Some('\\') => continue,
                // Some tools strip the single space from empty context lines
                None => {
                    hunk.push(LineKind::Context, "");
                    continue;
                }
                Some(_) => {}
            }
        } else if line.starts_with('\\') {
            continue;
        }

        if let Some(header) = parse_hunk_header(line) {
            if let Some(prev) = open.take() {
                file.hunks.push(prev.hunk);
            }
            let id = HunkId(next_hunk_id);
            next_hunk_id += 1;
            open = Some(OpenHunk {
                hunk: Hunk {
                    id,
                    old_start: header.old_start,
                    old_len: header.old_len,
                    new_start: header.new_start,
                    new_len: header.new_len,
                    lines: Vec::new(),
                },
                old_next: header.old_start,
                new_next: header.new_start,
                old_remaining: header.old_len,
                new_remaining: header.new_len,
            });
        } else if let Some(path) = line.strip_prefix("--- ") {
            file.old_path = strip_side_prefix(path, "a/");
        } else if let Some(path) = line.strip_prefix("+++ ") {
            file.new_path = strip_side_prefix(path, "b/");
        } else if let Some(path) = line.strip_prefix("rename from ") {
            file.rename_from = Some(path.to_string());
        } else if let Some(path) = line.strip_prefix("rename to ") {
            file.rename_to = Some(path.to_string());
        }
    }

    close_hunk(&mut current, &mut open);
    if let Some(file) = current.take() {
        files.push(file.finish(FileId(files.len() as u32)));
    }
    files
}

fn close_hunk(current: &mut Option<FileBuilder>, open: &mut Option<OpenHunk>) {
    if let (Some(file), Some(hunk)) = (current.as_mut(), open.take()) {
        file.hunks.push(hunk.hunk);
    }
}

/// Split `a/old b/new` from a `diff --git` line.
fn split_git_header(rest: &str) -> (Option<String>, Option<String>) {
    match rest.rfind(" b/") {
        Some(pos) => {
            let old = rest[..pos].strip_prefix("a/").unwrap_or(&rest[..pos]);
            let new = &rest[pos + 3..];
            (Some(old.to_string()), Some(new.to_string()))
        }
        None => (None, None),
    }
}

/// Path from a `---`/`+++` line, or `None` for `/dev/null`.
fn strip_side_prefix(path: &str, prefix: &str) -> Option<String> {
    // Trailing tab-separated timestamps appear in some diff producers
    let path = path.split('\t').next().unwrap_or(path).trim_end();
    if path == DEV_NULL {
        return None;
    }
    Some(path.strip_prefix(prefix).unwrap_or(path).to_string())
}

/// Parse `@@ -l[,s] +l[,s] @@ ...`. An omitted length means 1.
pub fn parse_hunk_header(line: &str) -> Option<HunkHeader> {
    let text = line.strip_prefix("@@")?.trim_start();
    let text = text.split("@@").next()?.trim();

    let mut it = text.split_whitespace();
    let (old_start, old_len) = parse_range(it.next()?.strip_prefix('-')?)?;
    let (new_start, new_len) = parse_range(it.next()?.strip_prefix('+')?)?;
    Some(HunkHeader {
        old_start,
        old_len,
        new_start,
        new_len,
    })
}

fn parse_range(s: &str) -> Option<(u32, u32)> {
    match s.split_once(',') {
        Some((start, len)) => Some((start.parse().ok()?, len.parse().ok()?)),
        None => Some((s.parse().ok()?, 1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_FILES: &str = "\
diff --git a/src/lib.rs b/src/lib.rs
index 1111111..2222222 100644
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -10,3 +10,4 @@ fn main() {
     let a = 1;
-    let b = 2;
+    let b = 3;
+    let c = 4;
     println!();
@@ -40 +41 @@
-old
+new
diff --git a/README.md b/README.md
new file mode 100644
index 0000000..3333333
--- /dev/null
+++ b/README.md
@@ -0,0 +1,2 @@
+# Title
+
";

    #[test]
    fn test_parse_hunk_header_full() {
        assert_eq!(
            parse_hunk_header("@@ -10,3 +10,4 @@ fn main() {"),
            Some(HunkHeader {
                old_start: 10,
                old_len: 3,
                new_start: 10,
                new_len: 4,
            })
        );
    }

    #[test]
    fn test_parse_hunk_header_omitted_lengths() {
        assert_eq!(
            parse_hunk_header("@@ -40 +41 @@"),
            Some(HunkHeader {
                old_start: 40,
                old_len: 1,
                new_start: 41,
                new_len: 1,
            })
        );
    }

    #[test]
    fn test_parse_hunk_header_invalid() {
        assert_eq!(parse_hunk_header("@@ nonsense @@"), None);
        assert_eq!(parse_hunk_header("not a header"), None);
    }

    #[test]
    fn test_parse_two_files() {
        let files = parse_unified(TWO_FILES);
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].id, FileId(0));
        assert_eq!(files[0].name, "src/lib.rs");
        assert_eq!(files[0].hunks.len(), 2);
        assert_eq!(files[1].id, FileId(1));
        assert_eq!(files[1].name, "README.md");
    }

    #[test]
    fn test_parse_line_numbers() {
        let files = parse_unified(TWO_FILES);
        let lines = &files[0].hunks[0].lines;
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0].kind, LineKind::Context);
        assert_eq!((lines[0].old_line, lines[0].new_line), (Some(10), Some(10)));
        assert_eq!(lines[1].kind, LineKind::Deletion);
        assert_eq!((lines[1].old_line, lines[1].new_line), (Some(11), None));
        assert_eq!(lines[2].kind, LineKind::Addition);
        assert_eq!((lines[2].old_line, lines[2].new_line), (None, Some(11)));
        assert_eq!(lines[3].new_line, Some(12));
        assert_eq!((lines[4].old_line, lines[4].new_line), (Some(12), Some(13)));
        assert_eq!(lines[1].content, "    let b = 2;");
    }

    #[test]
    fn test_hunk_ids_unique_across_files() {
        let files = parse_unified(TWO_FILES);
        let ids: Vec<HunkId> = files
            .iter()
            .flat_map(|f| f.hunks.iter().map(|h| h.id))
            .collect();
        assert_eq!(ids, vec![HunkId(0), HunkId(1), HunkId(2)]);
    }

    #[test]
    fn test_parse_new_file_with_empty_line() {
        let files = parse_unified(TWO_FILES);
        let hunk = &files[1].hunks[0];
        assert_eq!(hunk.old_start, 0);
        assert_eq!(hunk.lines.len(), 2);
        assert_eq!(hunk.lines[1].content, "");
        assert_eq!(hunk.lines[1].kind, LineKind::Addition);
    }

    #[test]
    fn test_parse_deleted_file_uses_old_path() {
        let text = "\
diff --git a/gone.txt b/gone.txt
deleted file mode 100644
--- a/gone.txt
+++ /dev/null
@@ -1 +0,0 @@
-bye
";
        let files = parse_unified(text);
        assert_eq!(files[0].name, "gone.txt");
        assert_eq!(files[0].hunks[0].lines[0].kind, LineKind::Deletion);
    }

    #[test]
    fn test_parse_rename_without_content() {
        let text = "\
diff --git a/old.rs b/new.rs
similarity index 100%
rename from old.rs
rename to new.rs
";
        let files = parse_unified(text);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "old.rs → new.rs");
        assert!(files[0].hunks.is_empty());
    }

    #[test]
    fn test_parse_binary_file() {
        let text = "\
diff --git a/logo.png b/logo.png
index 1111111..2222222 100644
Binary files a/logo.png and b/logo.png differ
";
        let files = parse_unified(text);
        assert_eq!(files[0].name, "logo.png");
        assert!(files[0].hunks.is_empty());
    }

    #[test]
    fn test_deletion_resembling_header_stays_content() {
        let text = "\
diff --git a/notes.md b/notes.md
--- a/notes.md
+++ b/notes.md
@@ -1,2 +1,1 @@
--- a/heading
 keep
";
        let files = parse_unified(text);
        let lines = &files[0].hunks[0].lines;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].kind, LineKind::Deletion);
        assert_eq!(lines[0].content, "-- a/heading");
        assert_eq!(files[0].name, "notes.md");
    }

    #[test]
    fn test_no_newline_marker_ignored() {
        let text = "\
diff --git a/a.txt b/a.txt
--- a/a.txt
+++ b/a.txt
@@ -1 +1 @@
-a
\\ No newline at end of file
+b
\\ No newline at end of file
";
        let files = parse_unified(text);
        let lines = &files[0].hunks[0].lines;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].content, "b");
    }

    #[test]
    fn test_line_numbers_saturate_at_u32_max() {
        let text = "\
diff --git a/big.txt b/big.txt
--- a/big.txt
+++ b/big.txt
@@ -4294967295,2 +4294967295,2 @@
 one
 two
";
        let files = parse_unified(text);
        let lines = &files[0].hunks[0].lines;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].old_line, Some(u32::MAX));
        assert_eq!(lines[1].old_line, Some(u32::MAX));
        assert_eq!(lines[1].new_line, Some(u32::MAX));
    }

    #[test]
    fn test_preamble_ignored() {
        let text = "Working copy changes:\nM a.txt\n";
        assert!(parse_unified(text).is_empty());
    }
}
