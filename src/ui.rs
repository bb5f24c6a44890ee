use crate::keymap::{Action, Keymap};
use crate::log::LogPicker;
use crate::models::{DiffRow, RowKind, TokenSpan};
use crate::session::WorkerState;
use crate::text::{calculate_padding, clip_spans, truncate_to_width};
use crate::theme::{ColorScheme, Theme};
use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Attribute, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use std::io::{self, Write};
use std::sync::Arc;
use unicode_width::UnicodeWidthStr;

/// Rows reserved below the diff for the status bar
pub const STATUS_HEIGHT: u16 = 1;

/// Transient message shown in the status bar until the next key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        StatusMessage {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        StatusMessage {
            text: text.into(),
            is_error: true,
        }
    }
}

/// Everything one frame needs, gathered by the viewer.
pub struct Frame<'a> {
    /// On-screen rows, top to bottom, each with its spans
    pub rows: &'a [(&'a DiffRow, Arc<[TokenSpan]>)],
    pub scroll_top: usize,
    pub total_rows: usize,
    pub number_width: usize,
    pub source_label: &'a str,
    pub file_count: usize,
    pub worker_state: &'a WorkerState,
    pub status: Option<&'a StatusMessage>,
    pub show_help: bool,
    pub keymap: &'a Keymap,
    pub theme: Theme,
    /// Open log picker, drawn in place of the diff
    pub log: Option<&'a LogPicker>,
}

/// Height of the diff area for a terminal `height` rows tall.
pub fn content_height(height: u16) -> usize {
    height.saturating_sub(STATUS_HEIGHT) as usize
}

/// Digits needed for the largest line number in `rows`.
pub fn number_width(rows: &[DiffRow]) -> usize {
    rows.iter()
        .flat_map(|r| [r.old_line, r.new_line])
        .flatten()
        .max()
        .map_or(1, |n| n.to_string().len())
}

/// Text painted on a collapsed gap row.
pub fn gap_label(lines: u32) -> String {
    match lines {
        1 => "⋯ 1 unchanged line".to_string(),
        n => format!("⋯ {n} unchanged lines"),
    }
}

/// Old and new line number columns, blank where a side has no line.
fn gutter(row: &DiffRow, number_width: usize) -> String {
    let old = row.old_line.map(|n| n.to_string()).unwrap_or_default();
    let new = row.new_line.map(|n| n.to_string()).unwrap_or_default();
    format!("{old:>number_width$} {new:>number_width$} ")
}

/// Width of the gutter produced for a given line number width.
pub fn gutter_width(number_width: usize) -> usize {
    number_width * 2 + 2
}

pub fn render(frame: &Frame) -> io::Result<()> {
    let (width, height) = terminal::size()?;
    let width = width as usize;
    let content_height = content_height(height);
    let colors = frame.theme.colors();

    let mut stdout = io::stdout();
    queue!(stdout, MoveTo(0, 0))?;

    let drawn = match frame.log {
        Some(picker) => render_log(&mut stdout, picker, width, content_height, &colors)?,
        None => {
            for (y, (row, spans)) in frame.rows.iter().take(content_height).enumerate() {
                queue!(stdout, MoveTo(0, y as u16))?;
                render_row(&mut stdout, row, spans, frame.number_width, width, &colors)?;
            }
            frame.rows.len().min(content_height)
        }
    };

    // Past the last row
    for y in drawn..content_height {
        queue!(
            stdout,
            MoveTo(0, y as u16),
            SetBackgroundColor(colors.bg),
            Clear(ClearType::UntilNewLine),
            ResetColor
        )?;
    }

    render_status_bar(&mut stdout, frame, &colors, width, height.saturating_sub(1))?;

    if frame.show_help {
        render_help_overlay(&mut stdout, frame.keymap, &colors, width as u16, height)?;
    }

    stdout.flush()?;
    Ok(())
}

fn render_row(
    stdout: &mut impl Write,
    row: &DiffRow,
    spans: &[TokenSpan],
    number_width: usize,
    width: usize,
    colors: &ColorScheme,
) -> io::Result<()> {
    match row.kind {
        RowKind::FileHeader => {
            let name = truncate_to_width(&format!(" {}", row.file_name), width);
            let padding = calculate_padding(&name, width);
            queue!(
                stdout,
                SetBackgroundColor(colors.header_bg),
                SetForegroundColor(colors.header_fg),
                SetAttribute(Attribute::Bold),
                Print(&name),
                Print(format!("{:padding$}", "")),
                SetAttribute(Attribute::Reset),
            )?;
        }
        RowKind::FileGap => {
            queue!(stdout, SetBackgroundColor(colors.bg), Print(format!("{:width$}", "")))?;
        }
        RowKind::Gap => {
            let indent = " ".repeat(gutter_width(number_width) + 1);
            let label = format!("{indent}{}", gap_label(row.gap_lines.unwrap_or(0)));
            let label = truncate_to_width(&label, width);
            let padding = calculate_padding(&label, width);
            queue!(
                stdout,
                SetBackgroundColor(colors.bg),
                SetForegroundColor(colors.gap_fg),
                Print(&label),
                Print(format!("{:padding$}", "")),
            )?;
        }
        RowKind::Context | RowKind::Addition | RowKind::Deletion => {
            let (line_bg, marker, marker_fg) = match row.kind {
                RowKind::Addition => (colors.diff_added_bg, "+", colors.diff_added_marker),
                RowKind::Deletion => (colors.diff_removed_bg, "-", colors.diff_removed_marker),
                _ => (colors.bg, " ", colors.fg),
            };

            let gutter = truncate_to_width(&gutter(row, number_width), width);
            queue!(
                stdout,
                SetBackgroundColor(colors.bg),
                SetForegroundColor(colors.line_number_fg),
                Print(&gutter),
            )?;
            let mut used = gutter.width();
            if used < width {
                queue!(
                    stdout,
                    SetBackgroundColor(line_bg),
                    SetForegroundColor(marker_fg),
                    Print(marker),
                )?;
                used += 1;
            }

            let (clipped, spans_width) = clip_spans(spans, width.saturating_sub(used));
            for span in &clipped {
                queue!(
                    stdout,
                    SetForegroundColor(span.color.unwrap_or(colors.fg)),
                    Print(&span.content),
                )?;
            }
            used += spans_width;

            let padding = width.saturating_sub(used);
            if padding > 0 {
                queue!(stdout, Print(format!("{:padding$}", "")))?;
            }
        }
    }
    queue!(stdout, ResetColor)?;
    Ok(())
}

/// Picker lines on screen, top to bottom, with whether each belongs to the
/// selected commit.
pub fn log_lines(picker: &LogPicker, height: usize) -> Vec<(&str, bool)> {
    let selected = picker.selected_index();
    picker
        .commits()
        .iter()
        .enumerate()
        .flat_map(|(i, commit)| commit.lines.iter().map(move |line| (line.as_str(), i == selected)))
        .skip(picker.scroll_for(height))
        .take(height)
        .collect()
}

/// Returns the number of screen rows drawn.
fn render_log(
    stdout: &mut impl Write,
    picker: &LogPicker,
    width: usize,
    height: usize,
    colors: &ColorScheme,
) -> io::Result<usize> {
    let lines = log_lines(picker, height);
    for (y, (line, is_selected)) in lines.iter().enumerate() {
        let (bg, fg) = if *is_selected {
            (colors.header_bg, colors.header_fg)
        } else {
            (colors.bg, colors.fg)
        };
        let text = truncate_to_width(line, width);
        let padding = calculate_padding(&text, width);
        queue!(
            stdout,
            MoveTo(0, y as u16),
            SetBackgroundColor(bg),
            SetForegroundColor(fg),
            Print(&text),
            Print(format!("{:padding$}", "")),
            ResetColor
        )?;
    }
    Ok(lines.len())
}

/// Left part of the status bar while the log picker is open.
pub fn log_summary(picker: &LogPicker) -> String {
    let count = picker.commits().len();
    let more = if picker.has_more() { "+" } else { "" };
    let position = if count == 0 { 0 } else { picker.selected_index() + 1 };
    format!(" jj log | change {position}/{count}{more} ")
}

/// Left part of the status bar: source, file count and row position.
pub fn status_summary(source: &str, file_count: usize, scroll_top: usize, total_rows: usize) -> String {
    let files = if file_count == 1 { "file" } else { "files" };
    let position = if total_rows == 0 { 0 } else { scroll_top + 1 };
    format!(" {source} | {file_count} {files} | row {position}/{total_rows} ")
}

fn render_status_bar(
    stdout: &mut impl Write,
    frame: &Frame,
    colors: &ColorScheme,
    width: usize,
    y: u16,
) -> io::Result<()> {
    queue!(stdout, MoveTo(0, y))?;

    if let Some(status) = frame.status {
        let (bg, fg) = if status.is_error {
            (colors.error_bg, colors.error_fg)
        } else {
            (colors.status_bg, colors.status_fg)
        };
        let text = truncate_to_width(&format!(" {}", status.text), width);
        let padding = calculate_padding(&text, width);
        queue!(
            stdout,
            SetBackgroundColor(bg),
            SetForegroundColor(fg),
            Print(&text),
            Print(format!("{:padding$}", "")),
            ResetColor
        )?;
        return Ok(());
    }

    let left = match frame.log {
        Some(picker) => log_summary(picker),
        None => status_summary(frame.source_label, frame.file_count, frame.scroll_top, frame.total_rows),
    };
    let right = format!(" syntax: {} ", frame.worker_state);
    let help = format!(" {} help ", frame.keymap.keys_label(Action::Help));

    let left = truncate_to_width(&left, width);
    let mut used = left.width();
    queue!(
        stdout,
        SetBackgroundColor(colors.status_bg),
        SetForegroundColor(colors.status_fg),
        Print(&left),
    )?;

    // Right-aligned highlighter state, dropped when it does not fit
    let tail_width = right.width() + help.width();
    if used + tail_width <= width {
        let gap = width - used - tail_width;
        let (state_bg, state_fg) = match frame.worker_state {
            WorkerState::Failed(_) => (colors.error_bg, colors.error_fg),
            _ => (colors.status_accent_bg, colors.status_accent_fg),
        };
        queue!(
            stdout,
            Print(format!("{:gap$}", "")),
            Print(&help),
            SetBackgroundColor(state_bg),
            SetForegroundColor(state_fg),
            Print(&right),
        )?;
        used = width;
    }

    let padding = width.saturating_sub(used);
    if padding > 0 {
        queue!(stdout, Print(format!("{:padding$}", "")))?;
    }
    queue!(stdout, ResetColor)?;
    Ok(())
}

/// Lines of the help box: one per action.
pub fn help_lines(keymap: &Keymap) -> Vec<String> {
    let labels: Vec<(String, &str)> = Action::ALL
        .iter()
        .map(|&a| (keymap.keys_label(a), a.description()))
        .collect();
    let key_width = labels.iter().map(|(k, _)| k.width()).max().unwrap_or(0);
    labels
        .into_iter()
        .map(|(keys, description)| {
            let keys = if keys.is_empty() { "-".to_string() } else { keys };
            let padding = calculate_padding(&keys, key_width);
            format!(" {keys}{:padding$}  {description}", "")
        })
        .collect()
}

fn render_help_overlay(
    stdout: &mut impl Write,
    keymap: &Keymap,
    colors: &ColorScheme,
    width: u16,
    height: u16,
) -> io::Result<()> {
    let mut lines = vec![" KEYS".to_string(), String::new()];
    lines.extend(help_lines(keymap));
    lines.push(String::new());
    lines.push(" Press any key to close".to_string());

    let inner_width = lines.iter().map(|l| l.width()).max().unwrap_or(0) + 2;
    let box_width = (inner_width as u16 + 2).min(width);
    let box_height = (lines.len() as u16 + 2).min(height);
    if box_width < 4 || box_height < 3 {
        return Ok(());
    }
    let inner = box_width as usize - 2;
    let start_x = (width - box_width) / 2;
    let start_y = (height - box_height) / 2;

    queue!(
        stdout,
        SetBackgroundColor(colors.help_bg),
        SetForegroundColor(colors.help_fg),
        MoveTo(start_x, start_y),
        Print(format!("╔{}╗", "═".repeat(inner))),
    )?;
    for (i, line) in lines.iter().take(box_height as usize - 2).enumerate() {
        let text = truncate_to_width(line, inner);
        let padding = calculate_padding(&text, inner);
        queue!(
            stdout,
            MoveTo(start_x, start_y + 1 + i as u16),
            Print(format!("║{text}{:padding$}║", "")),
        )?;
    }
    queue!(
        stdout,
        MoveTo(start_x, start_y + box_height - 1),
        Print(format!("╚{}╝", "═".repeat(inner))),
        ResetColor
    )?;
    Ok(())
}
