//! Row flattening: turns files → hunks → lines into one addressable row sequence.
//!
//! The flattened sequence is what the viewport scrolls over. Synthetic rows
//! (file headers, collapsed-gap markers, file separators) are interleaved with
//! the content rows, and every row gets a global 0-based index.

use crate::models::{DiffRow, FileId, FlattenedFile, Hunk, HunkId, RowKind, Side};

/// Flatten parsed files into display rows.
///
/// Pure and deterministic. Hunks are assumed ordered and non-overlapping.
pub fn flatten(files: &[FlattenedFile]) -> Vec<DiffRow> {
    let total_lines: usize = files
        .iter()
        .flat_map(|f| f.hunks.iter())
        .map(|h| h.lines.len() + 1)
        .sum();
    let mut rows = Vec::with_capacity(total_lines + files.len() * 2);

    for (file_index, file) in files.iter().enumerate() {
        push_structural(&mut rows, RowKind::FileHeader, file, file.name.clone(), None);

        let mut prev_hunk: Option<&Hunk> = None;
        for hunk in &file.hunks {
            let gap = gap_before(prev_hunk, hunk);
            if gap > 0 {
                push_structural(&mut rows, RowKind::Gap, file, String::new(), Some(gap));
            }

            for line in &hunk.lines {
                let kind = RowKind::from(line.kind);
                let side = match kind {
                    RowKind::Deletion => Some(Side::Left),
                    RowKind::Addition => Some(Side::Right),
                    _ => None,
                };
                let row_index = rows.len();
                rows.push(DiffRow {
                    kind,
                    content: line.content.clone(),
                    file_id: file.id,
                    hunk_id: Some(hunk.id),
                    old_line: line.old_line,
                    new_line: line.new_line,
                    side,
                    row_index,
                    file_name: file.name.clone(),
                    gap_lines: None,
                });
            }

            prev_hunk = Some(hunk);
        }

        if file_index + 1 < files.len() {
            push_structural(&mut rows, RowKind::FileGap, file, String::new(), None);
        }
    }

    rows
}

/// Number of unchanged lines hidden before `hunk`.
///
/// Before the first hunk this is the distance from line 1; between hunks it is
/// the distance from the previous hunk's end. The larger of the old and new
/// side distances wins. Saturates at 0 for malformed input.
fn gap_before(prev: Option<&Hunk>, hunk: &Hunk) -> u32 {
    let (old_from, new_from) = match prev {
        None => (1, 1),
        Some(prev) => (prev.old_end(), prev.new_end()),
    };
    let gap_old = hunk.old_start.saturating_sub(old_from);
    let gap_new = hunk.new_start.saturating_sub(new_from);
    gap_old.max(gap_new)
}

fn push_structural(
    rows: &mut Vec<DiffRow>,
    kind: RowKind,
    file: &FlattenedFile,
    content: String,
    gap_lines: Option<u32>,
) {
    let row_index = rows.len();
    rows.push(DiffRow {
        kind,
        content,
        file_id: file.id,
        hunk_id: None,
        old_line: None,
        new_line: None,
        side: None,
        row_index,
        file_name: file.name.clone(),
        gap_lines,
    });
}

// ============================================================================
// Row Index Lookups
// ============================================================================

/// Position of the first content row of `hunk_id`, if any.
///
/// Header and gap rows never match, even when they belong to the hunk's file.
pub fn index_of_hunk(rows: &[DiffRow], hunk_id: HunkId) -> Option<usize> {
    rows.iter()
        .position(|r| r.hunk_id == Some(hunk_id) && !r.kind.is_structural())
}

/// Position of the file header row for `file_id`, if any.
pub fn index_of_file(rows: &[DiffRow], file_id: FileId) -> Option<usize> {
    rows.iter()
        .position(|r| r.file_id == file_id && r.kind == RowKind::FileHeader)
}

/// Hunk whose first content row comes strictly after row `from`.
pub fn next_hunk(rows: &[DiffRow], from: usize) -> Option<HunkId> {
    hunk_starts(rows).find(|&(pos, _)| pos > from).map(|(_, id)| id)
}

/// Hunk whose first content row comes strictly before row `from`.
pub fn prev_hunk(rows: &[DiffRow], from: usize) -> Option<HunkId> {
    hunk_starts(rows)
        .take_while(|&(pos, _)| pos < from)
        .last()
        .map(|(_, id)| id)
}

/// File whose header comes strictly after row `from`.
pub fn next_file(rows: &[DiffRow], from: usize) -> Option<FileId> {
    rows.iter()
        .skip(from.saturating_add(1))
        .find(|r| r.kind == RowKind::FileHeader)
        .map(|r| r.file_id)
}

/// File whose header comes strictly before row `from`.
pub fn prev_file(rows: &[DiffRow], from: usize) -> Option<FileId> {
    rows.iter()
        .take(from.min(rows.len()))
        .rev()
        .find(|r| r.kind == RowKind::FileHeader)
        .map(|r| r.file_id)
}

/// (row position, hunk id) of every hunk's first content row, in order.
fn hunk_starts(rows: &[DiffRow]) -> impl Iterator<Item = (usize, HunkId)> + '_ {
    rows.iter().enumerate().filter_map(|(pos, row)| {
        let id = row.hunk_id?;
        let starts_hunk = pos == 0 || rows[pos - 1].hunk_id != Some(id);
        (!row.kind.is_structural() && starts_hunk).then_some((pos, id))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DiffLine, LineKind};

    fn line(kind: LineKind, content: &str, old: Option<u32>, new: Option<u32>) -> DiffLine {
        DiffLine {
            kind,
            content: content.to_string(),
            old_line: old,
            new_line: new,
        }
    }

    fn hunk(id: u32, old_start: u32, old_len: u32, new_start: u32, new_len: u32) -> Hunk {
        let mut lines = Vec::new();
        for i in 0..old_len.min(new_len) {
            lines.push(line(
                LineKind::Context,
                "ctx",
                Some(old_start + i),
                Some(new_start + i),
            ));
        }
        for i in new_len.min(old_len)..new_len {
            lines.push(line(LineKind::Addition, "add", None, Some(new_start + i)));
        }
        for i in old_len.min(new_len)..old_len {
            lines.push(line(LineKind::Deletion, "del", Some(old_start + i), None));
        }
        Hunk {
            id: HunkId(id),
            old_start,
            old_len,
            new_start,
            new_len,
            lines,
        }
    }

    fn file(id: u32, name: &str, hunks: Vec<Hunk>) -> FlattenedFile {
        FlattenedFile {
            id: FileId(id),
            name: name.to_string(),
            hunks,
        }
    }

    fn kinds(rows: &[DiffRow]) -> Vec<RowKind> {
        rows.iter().map(|r| r.kind).collect()
    }

    #[test]
    fn test_flatten_empty_input() {
        assert!(flatten(&[]).is_empty());
    }

    #[test]
    fn test_flatten_single_file_layout() {
        let files = vec![file(0, "src/lib.rs", vec![hunk(0, 5, 2, 5, 3)])];
        let rows = flatten(&files);

        assert_eq!(
            kinds(&rows),
            vec![
                RowKind::FileHeader,
                RowKind::Gap,
                RowKind::Context,
                RowKind::Context,
                RowKind::Addition,
            ]
        );
        assert_eq!(rows[0].content, "src/lib.rs");
        assert_eq!(rows[0].file_name, "src/lib.rs");
        assert_eq!(rows[1].gap_lines, Some(4));
        assert_eq!(rows[1].hunk_id, None);
        assert_eq!(rows[4].side, Some(Side::Right));
        assert_eq!(rows[4].new_line, Some(7));
        assert_eq!(rows[4].old_line, None);
    }

    #[test]
    fn test_flatten_hunk_at_line_one_has_no_leading_gap() {
        let files = vec![file(0, "a", vec![hunk(0, 1, 1, 1, 1)])];
        let rows = flatten(&files);
        assert_eq!(kinds(&rows), vec![RowKind::FileHeader, RowKind::Context]);
    }

    #[test]
    fn test_flatten_leading_gap_uses_larger_side() {
        let files = vec![file(0, "a", vec![hunk(0, 3, 1, 8, 1)])];
        let rows = flatten(&files);
        assert_eq!(rows[1].kind, RowKind::Gap);
        assert_eq!(rows[1].gap_lines, Some(7));
    }

    #[test]
    fn test_flatten_adjacent_hunks_have_no_gap() {
        // Second hunk starts exactly where the first ends on both sides
        let files = vec![file(
            0,
            "a",
            vec![hunk(0, 1, 3, 1, 4), hunk(1, 4, 2, 5, 2)],
        )];
        let rows = flatten(&files);
        assert!(rows.iter().all(|r| r.kind != RowKind::Gap));
    }

    #[test]
    fn test_flatten_gap_between_hunks() {
        let files = vec![file(
            0,
            "a",
            vec![hunk(0, 1, 3, 1, 3), hunk(1, 10, 2, 12, 2)],
        )];
        let rows = flatten(&files);
        let gaps: Vec<_> = rows.iter().filter(|r| r.kind == RowKind::Gap).collect();
        assert_eq!(gaps.len(), 1);
        // old: 10 - 4 = 6, new: 12 - 4 = 8
        assert_eq!(gaps[0].gap_lines, Some(8));
        assert_eq!(gaps[0].row_index, 4);
    }

    #[test]
    fn test_flatten_file_gap_between_files_only() {
        let files = vec![
            file(0, "a", vec![hunk(0, 1, 1, 1, 1)]),
            file(1, "b", vec![hunk(1, 1, 1, 1, 1)]),
            file(2, "c", vec![hunk(2, 1, 1, 1, 1)]),
        ];
        let rows = flatten(&files);

        let file_gaps: Vec<_> = rows.iter().filter(|r| r.kind == RowKind::FileGap).collect();
        assert_eq!(file_gaps.len(), 2);
        assert_eq!(file_gaps[0].file_id, FileId(0));
        assert_eq!(file_gaps[1].file_id, FileId(1));
        assert_ne!(rows.last().map(|r| r.kind), Some(RowKind::FileGap));
    }

    #[test]
    fn test_flatten_file_without_hunks() {
        let files = vec![file(0, "renamed.txt", vec![]), file(1, "b", vec![])];
        let rows = flatten(&files);
        assert_eq!(
            kinds(&rows),
            vec![RowKind::FileHeader, RowKind::FileGap, RowKind::FileHeader]
        );
    }

    #[test]
    fn test_flatten_row_indices_contiguous() {
        let files = vec![
            file(0, "a", vec![hunk(0, 4, 3, 4, 2), hunk(1, 20, 1, 19, 5)]),
            file(1, "b", vec![]),
            file(2, "c", vec![hunk(2, 100, 2, 90, 0)]),
        ];
        let rows = flatten(&files);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.row_index, i);
        }
    }

    #[test]
    fn test_flatten_sides_and_tags() {
        let files = vec![file(3, "x", vec![hunk(7, 1, 2, 1, 1)])];
        let rows = flatten(&files);
        let deletion = rows.iter().find(|r| r.kind == RowKind::Deletion).unwrap();
        assert_eq!(deletion.side, Some(Side::Left));
        assert_eq!(deletion.hunk_id, Some(HunkId(7)));
        assert_eq!(deletion.file_id, FileId(3));
        let context = rows.iter().find(|r| r.kind == RowKind::Context).unwrap();
        assert_eq!(context.side, None);
    }

    #[test]
    fn test_flatten_is_deterministic() {
        let files = vec![file(0, "a", vec![hunk(0, 3, 2, 3, 2)])];
        assert_eq!(flatten(&files), flatten(&files));
    }

    #[test]
    fn test_index_of_hunk_finds_first_content_row() {
        let files = vec![
            file(0, "a", vec![hunk(0, 1, 1, 1, 1)]),
            file(1, "b", vec![hunk(1, 10, 2, 10, 2)]),
        ];
        let rows = flatten(&files);
        // header a, ctx, file-gap, header b, gap, ctx, ctx
        assert_eq!(index_of_hunk(&rows, HunkId(1)), Some(5));
        assert_eq!(index_of_hunk(&rows, HunkId(0)), Some(1));
        assert_eq!(index_of_hunk(&rows, HunkId(9)), None);
    }

    #[test]
    fn test_index_of_hunk_ignores_structural_rows() {
        let mut rows = flatten(&[file(0, "a", vec![])]);
        rows.push(DiffRow {
            kind: RowKind::Gap,
            content: String::new(),
            file_id: FileId(0),
            hunk_id: Some(HunkId(4)),
            old_line: None,
            new_line: None,
            side: None,
            row_index: 1,
            file_name: "a".to_string(),
            gap_lines: Some(3),
        });
        rows[0].hunk_id = Some(HunkId(4));
        assert_eq!(index_of_hunk(&rows, HunkId(4)), None);
    }

    #[test]
    fn test_index_of_file() {
        let files = vec![
            file(0, "a", vec![hunk(0, 1, 1, 1, 1)]),
            file(1, "b", vec![]),
        ];
        let rows = flatten(&files);
        assert_eq!(index_of_file(&rows, FileId(0)), Some(0));
        assert_eq!(index_of_file(&rows, FileId(1)), Some(3));
        assert_eq!(index_of_file(&rows, FileId(2)), None);
    }

    #[test]
    fn test_next_and_prev_hunk() {
        let files = vec![file(
            0,
            "a",
            vec![hunk(0, 1, 2, 1, 2), hunk(1, 10, 2, 10, 2)],
        )];
        let rows = flatten(&files);
        // header, ctx, ctx, gap, ctx, ctx
        assert_eq!(next_hunk(&rows, 0), Some(HunkId(0)));
        assert_eq!(next_hunk(&rows, 1), Some(HunkId(1)));
        assert_eq!(next_hunk(&rows, 4), None);
        assert_eq!(prev_hunk(&rows, 5), Some(HunkId(1)));
        assert_eq!(prev_hunk(&rows, 4), Some(HunkId(0)));
        assert_eq!(prev_hunk(&rows, 1), None);
    }

    #[test]
    fn test_next_and_prev_file() {
        let files = vec![
            file(0, "a", vec![hunk(0, 1, 1, 1, 1)]),
            file(1, "b", vec![hunk(1, 1, 1, 1, 1)]),
        ];
        let rows = flatten(&files);
        // header a, ctx, file-gap, header b, ctx
        assert_eq!(next_file(&rows, 0), Some(FileId(1)));
        assert_eq!(next_file(&rows, 3), None);
        assert_eq!(prev_file(&rows, 4), Some(FileId(1)));
        assert_eq!(prev_file(&rows, 3), Some(FileId(0)));
        assert_eq!(prev_file(&rows, 0), None);
    }
}
