use crate::models::TokenSpan;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Columns a tab expands to
pub const TAB_WIDTH: usize = 4;

const C0_CARET: [&str; 32] = [
    "^@", "^A", "^B", "^C", "^D", "^E", "^F", "^G", "^H", "^I", "^J", "^K", "^L", "^M", "^N", "^O",
    "^P", "^Q", "^R", "^S", "^T", "^U", "^V", "^W", "^X", "^Y", "^Z", "^[", "^\\", "^]", "^^", "^_",
];

/// Printable stand-in for a control character: caret notation for C0 and
/// DEL, U+FFFD for the C1 range.
fn control_stand_in(ch: char) -> Option<&'static str> {
    match ch {
        '\0'..='\x1f' => Some(C0_CARET[ch as usize]),
        '\x7f' => Some("^?"),
        c if c.is_control() => Some("\u{fffd}"),
        _ => None,
    }
}

/// Columns `ch` occupies once control characters are replaced.
fn display_width(ch: char) -> usize {
    match control_stand_in(ch) {
        Some(stand_in) => stand_in.width(),
        None => ch.width().unwrap_or(0),
    }
}

/// Safely truncate text to visual width limit.
/// Returns string that fits within `max_width` visual columns. Control
/// characters are replaced so nothing reaches the terminal as an escape.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    fit_to_width(text, max_width).0
}

/// Truncated text, its width, and whether all of `text` fit.
fn fit_to_width(text: &str, max_width: usize) -> (String, usize, bool) {
    let mut result = String::new();
    let mut current_width = 0;

    for ch in text.chars() {
        let char_width = display_width(ch);
        if current_width + char_width > max_width {
            return (result, current_width, false);
        }
        match control_stand_in(ch) {
            Some(stand_in) => result.push_str(stand_in),
            None => result.push(ch),
        }
        current_width += char_width;
    }

    (result, current_width, true)
}

/// Calculate padding needed to reach visual width.
/// Returns number of spaces needed.
pub fn calculate_padding(current_text: &str, target_width: usize) -> usize {
    target_width.saturating_sub(current_text.width())
}

/// Replace tabs with spaces, aligned to `TAB_WIDTH` columns starting at `start_col`.
pub fn expand_tabs(text: &str, start_col: usize) -> String {
    if !text.contains('\t') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + TAB_WIDTH);
    let mut col = start_col;
    for ch in text.chars() {
        if ch == '\t' {
            let spaces = TAB_WIDTH - (col % TAB_WIDTH);
            out.extend(std::iter::repeat(' ').take(spaces));
            col += spaces;
        } else {
            out.push(ch);
            col += display_width(ch);
        }
    }
    out
}

/// Clip colored spans to `max_width` columns, expanding tabs on the way.
/// Returns the clipped spans and the width they occupy.
pub fn clip_spans(spans: &[TokenSpan], max_width: usize) -> (Vec<TokenSpan>, usize) {
    let mut clipped = Vec::with_capacity(spans.len());
    let mut used = 0;

    for span in spans {
        if used >= max_width {
            break;
        }
        let expanded = expand_tabs(&span.content, used);
        let (piece, piece_width, complete) = fit_to_width(&expanded, max_width - used);
        if !piece.is_empty() {
            clipped.push(TokenSpan {
                content: piece,
                color: span.color,
            });
        }
        used += piece_width;
        if !complete {
            break;
        }
    }

    (clipped, used)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::style::Color;

    #[test]
    fn test_truncate_to_width_ascii() {
        let text = "Hello World";
        assert_eq!(truncate_to_width(text, 5), "Hello");
        assert_eq!(truncate_to_width(text, 11), "Hello World");
        assert_eq!(truncate_to_width(text, 0), "");
    }

    #[test]
    fn test_truncate_to_width_emoji() {
        let text = "Hello 🎉 World";
        // "Hello " = 6 cols, 🎉 = 2 cols, so max 7 should give "Hello "
        assert_eq!(truncate_to_width(text, 7), "Hello ");
        assert_eq!(truncate_to_width(text, 8), "Hello 🎉");
    }

    #[test]
    fn test_truncate_to_width_cjk() {
        let text = "你好世界"; // Each CJK char = 2 visual columns
        assert_eq!(truncate_to_width(text, 5), "你好");
        assert_eq!(truncate_to_width(text, 4), "你好");
        assert_eq!(truncate_to_width(text, 3), "你");
    }

    #[test]
    fn test_calculate_padding_wide_chars() {
        assert_eq!(calculate_padding("你好", 10), 6);
        assert_eq!(calculate_padding("abc", 2), 0);
    }

    #[test]
    fn test_expand_tabs() {
        assert_eq!(expand_tabs("\tx", 0), "    x");
        assert_eq!(expand_tabs("ab\tx", 0), "ab  x");
        assert_eq!(expand_tabs("\tx", 2), "  x");
        assert_eq!(expand_tabs("none", 0), "none");
    }

    #[test]
    fn test_clip_spans_fits() {
        let spans = vec![TokenSpan::plain("let "), TokenSpan::plain("x")];
        let (clipped, used) = clip_spans(&spans, 20);
        assert_eq!(clipped, spans);
        assert_eq!(used, 5);
    }

    #[test]
    fn test_clip_spans_truncates_and_keeps_color() {
        let spans = vec![
            TokenSpan::plain("abc"),
            TokenSpan {
                content: "defgh".to_string(),
                color: Some(Color::Red),
            },
            TokenSpan::plain("ijk"),
        ];
        let (clipped, used) = clip_spans(&spans, 5);
        assert_eq!(used, 5);
        assert_eq!(clipped.len(), 2);
        assert_eq!(clipped[1].content, "de");
        assert_eq!(clipped[1].color, Some(Color::Red));
    }

    #[test]
    fn test_clip_spans_expands_tabs_across_spans() {
        let spans = vec![TokenSpan::plain("a"), TokenSpan::plain("\tb")];
        let (clipped, used) = clip_spans(&spans, 10);
        assert_eq!(clipped[1].content, "   b");
        assert_eq!(used, 5);
    }

    #[test]
    fn test_control_characters_are_made_visible() {
        assert_eq!(truncate_to_width("a\x1b[31mb\r", 20), "a^[[31mb^M");
        assert_eq!(truncate_to_width("x\x7f\u{9b}", 20), "x^?\u{fffd}");
        // A stand-in is never split
        assert_eq!(truncate_to_width("a\x1b", 2), "a");
    }

    #[test]
    fn test_clip_spans_replaces_control_characters() {
        let spans = vec![
            TokenSpan::plain("a\x1b[31m"),
            TokenSpan {
                content: "b\r".to_string(),
                color: Some(Color::Red),
            },
        ];
        let (clipped, used) = clip_spans(&spans, 40);
        let text: String = clipped.iter().map(|s| s.content.as_str()).collect();
        assert_eq!(text, "a^[[31mb^M");
        assert!(!text.chars().any(char::is_control));
        assert_eq!(used, 10);
    }

    #[test]
    fn test_tab_stops_count_stand_in_width() {
        assert_eq!(expand_tabs("\x01\tx", 0), "\x01  x");
    }

    #[test]
    fn test_clip_spans_wide_char_boundary() {
        let spans = vec![TokenSpan::plain("a你好")];
        let (clipped, used) = clip_spans(&spans, 4);
        assert_eq!(clipped[0].content, "a你");
        assert_eq!(used, 3);
    }
}
