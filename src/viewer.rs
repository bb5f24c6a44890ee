use crate::config::ViewerConfig;
use crate::diff::parse_unified;
use crate::highlighting::HighlighterOptions;
use crate::keymap::{Action, Keymap};
use crate::language::detect_language;
use crate::log::{self, LogPicker};
use crate::models::{DiffRow, FileId, TokenSpan};
use crate::rows;
use crate::session::HighlightSession;
use crate::source::DiffSource;
use crate::theme::Theme;
use crate::ui::{self, Frame, StatusMessage};
use crate::viewport::{max_scroll, scroll_into_view, visible_range, ViewportState, SCROLL_MARGIN};
use crossterm::{
    cursor::{Hide, Show},
    event::{self, Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How long the event loop waits for input before polling the worker
const POLL_INTERVAL: Duration = Duration::from_millis(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct Viewer {
    source: DiffSource,
    rows: Vec<DiffRow>,
    file_count: usize,
    languages: HashMap<FileId, Option<String>>,
    number_width: usize,
    scroll_top: usize,
    /// Row the last jump landed on; next/prev searches start here
    anchor: usize,
    viewport_height: usize,
    overscan: usize,
    theme: Theme,
    syntax_dir: Option<PathBuf>,
    keymap: Keymap,
    session: HighlightSession,
    status: Option<StatusMessage>,
    show_help: bool,
    /// Open log picker; keys drive the selection while it is set
    log: Option<LogPicker>,
    dirty: bool,
}

impl Viewer {
    pub fn new(config: ViewerConfig, diff_text: &str) -> Self {
        let mut viewer = Viewer {
            source: config.source,
            rows: Vec::new(),
            file_count: 0,
            languages: HashMap::new(),
            number_width: 1,
            scroll_top: 0,
            anchor: 0,
            viewport_height: 0,
            overscan: config.overscan,
            theme: config.theme,
            syntax_dir: config.syntax_dir,
            keymap: config.keymap,
            session: HighlightSession::new(config.cache_capacity),
            status: None,
            show_help: false,
            log: None,
            dirty: true,
        };
        viewer.set_diff(diff_text);
        viewer
    }

    /// Replace the displayed diff, keeping the scroll position where possible.
    fn set_diff(&mut self, diff_text: &str) {
        let files = parse_unified(diff_text);
        self.file_count = files.len();
        self.languages = files
            .iter()
            .map(|f| (f.id, detect_language(&f.name)))
            .collect();
        self.rows = rows::flatten(&files);
        self.number_width = ui::number_width(&self.rows);
        self.session.reset_rows();
        self.clamp_scroll();
        self.anchor = self.anchor.min(self.rows.len().saturating_sub(1));
        info!(
            files = self.file_count,
            rows = self.rows.len(),
            cached = self.session.cache_len(),
            "diff loaded"
        );
        self.dirty = true;
    }

    pub fn run(&mut self) -> io::Result<()> {
        let (_, height) = terminal::size()?;
        self.viewport_height = ui::content_height(height);
        self.session.start(self.highlighter_options());

        terminal::enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, Hide)?;

        let result = self.event_loop();

        execute!(io::stdout(), LeaveAlternateScreen, Show)?;
        terminal::disable_raw_mode()?;

        result
    }

    fn event_loop(&mut self) -> io::Result<()> {
        loop {
            if self.session.poll() {
                self.dirty = true;
            }
            if self.dirty {
                self.draw()?;
                self.dirty = false;
            }

            if !event::poll(POLL_INTERVAL)? {
                continue;
            }
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if self.handle_key(key) == Flow::Quit {
                        break;
                    }
                    self.dirty = true;
                }
                Event::Resize(_, height) => {
                    self.resize(ui::content_height(height));
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn draw(&mut self) -> io::Result<()> {
        let range = visible_range(self.viewport(), self.overscan);
        self.session.set_visible_range(range.clone());

        let screen_end = (self.scroll_top + self.viewport_height).min(self.rows.len());
        let mut on_screen: Vec<(&DiffRow, Arc<[TokenSpan]>)> = Vec::with_capacity(self.viewport_height);
        for index in range {
            let row = &self.rows[index];
            let spans: Arc<[TokenSpan]> = if row.kind.is_structural() {
                Arc::from(Vec::new())
            } else {
                let language = self.languages.get(&row.file_id).and_then(|l| l.as_deref());
                self.session.tokens_for_row(index, &row.content, language)
            };
            if (self.scroll_top..screen_end).contains(&index) {
                on_screen.push((row, spans));
            }
        }

        let source_label = self.source.to_string();
        ui::render(&Frame {
            rows: &on_screen,
            scroll_top: self.scroll_top,
            total_rows: self.rows.len(),
            number_width: self.number_width,
            source_label: &source_label,
            file_count: self.file_count,
            worker_state: self.session.state(),
            status: self.status.as_ref(),
            show_help: self.show_help,
            keymap: &self.keymap,
            theme: self.theme,
            log: self.log.as_ref(),
        })
    }

    fn handle_key(&mut self, key: KeyEvent) -> Flow {
        self.status = None;
        let action = self.keymap.resolve(&key);

        if self.show_help {
            self.show_help = false;
            return match action {
                Some(Action::Quit) => Flow::Quit,
                _ => Flow::Continue,
            };
        }

        match action {
            Some(action) => {
                debug!(action = action.name(), picker = self.log.is_some(), "key");
                if self.log.is_some() {
                    self.apply_in_log(action)
                } else {
                    self.apply(action)
                }
            }
            None => Flow::Continue,
        }
    }

    /// Keys while the log picker is open. Quit closes the picker.
    fn apply_in_log(&mut self, action: Action) -> Flow {
        let page = self.viewport_height.max(1) as isize;
        let Some(picker) = self.log.as_mut() else {
            return Flow::Continue;
        };
        match action {
            Action::ScrollDown | Action::NextHunk | Action::NextFile => picker.move_by(1),
            Action::ScrollUp | Action::PrevHunk | Action::PrevFile => picker.move_by(-1),
            Action::PageDown => picker.move_by(page),
            Action::PageUp => picker.move_by(-page),
            Action::HalfPageDown => picker.move_by((page / 2).max(1)),
            Action::HalfPageUp => picker.move_by(-(page / 2).max(1)),
            Action::Top => picker.select_first(),
            Action::Bottom => picker.select_last(),
            Action::Select => self.show_selected_change(),
            Action::Log | Action::Quit => self.log = None,
            Action::Reload => self.open_log(),
            Action::ToggleTheme => self.toggle_theme(),
            Action::Help => self.show_help = true,
        }
        Flow::Continue
    }

    fn apply(&mut self, action: Action) -> Flow {
        let page = self.viewport_height.max(1);
        match action {
            Action::ScrollDown => self.scroll_by(1),
            Action::ScrollUp => self.scroll_by(-1),
            Action::PageDown => self.scroll_by(page as isize),
            Action::PageUp => self.scroll_by(-(page as isize)),
            Action::HalfPageDown => self.scroll_by((page / 2).max(1) as isize),
            Action::HalfPageUp => self.scroll_by(-((page / 2).max(1) as isize)),
            Action::Top => self.scroll_to(0),
            Action::Bottom => self.scroll_to(self.max_scroll()),
            Action::NextHunk => {
                let target = rows::next_hunk(&self.rows, self.anchor)
                    .and_then(|id| rows::index_of_hunk(&self.rows, id));
                self.jump(target, "No more hunks");
            }
            Action::PrevHunk => {
                let target = rows::prev_hunk(&self.rows, self.anchor)
                    .and_then(|id| rows::index_of_hunk(&self.rows, id));
                self.jump(target, "Already at first hunk");
            }
            Action::NextFile => {
                let target = rows::next_file(&self.rows, self.anchor)
                    .and_then(|id| rows::index_of_file(&self.rows, id));
                self.jump(target, "No more files");
            }
            Action::PrevFile => {
                let target = rows::prev_file(&self.rows, self.anchor)
                    .and_then(|id| rows::index_of_file(&self.rows, id));
                self.jump(target, "Already at first file");
            }
            Action::Reload => self.reload(),
            Action::ToggleTheme => self.toggle_theme(),
            Action::Log => self.open_log(),
            Action::Select => {}
            Action::Help => self.show_help = true,
            Action::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        self.session.restart(self.highlighter_options());
    }

    /// Fetch the log and open the picker on the revision being shown.
    fn open_log(&mut self) {
        let DiffSource::Jj { repo, revision } = &self.source else {
            self.status = Some(StatusMessage::error("Log needs a jj repository"));
            return;
        };
        match log::fetch_log(repo, None, log::DEFAULT_LIMIT) {
            Ok(page) if page.commits.is_empty() => {
                self.status = Some(StatusMessage::info("jj log is empty"));
            }
            Ok(page) => {
                info!(commits = page.commits.len(), has_more = page.has_more, "log picker opened");
                self.log = Some(LogPicker::new(page, revision));
            }
            Err(err) => {
                warn!(error = %err, "jj log failed");
                self.status = Some(StatusMessage::error(err.to_string()));
            }
        }
    }

    /// Load the picked change's diff and close the picker. On failure the
    /// picker stays open and the previous diff is kept.
    fn show_selected_change(&mut self) {
        let Some(commit) = self.log.as_ref().and_then(|p| p.selected()) else {
            return;
        };
        let DiffSource::Jj { repo, .. } = &self.source else {
            return;
        };
        let source = DiffSource::Jj {
            repo: repo.clone(),
            revision: commit.change_id.clone(),
        };
        let label = format!("{} {}", commit.change_id, commit.description);

        match source.load() {
            Ok(text) => {
                self.source = source;
                self.log = None;
                self.scroll_top = 0;
                self.anchor = 0;
                self.set_diff(&text);
                self.status = Some(StatusMessage::info(label));
            }
            Err(err) => {
                warn!(error = %err, revision = %commit.change_id, "loading picked change failed");
                self.status = Some(StatusMessage::error(err.to_string()));
            }
        }
    }

    fn reload(&mut self) {
        if !self.source.can_reload() {
            self.status = Some(StatusMessage::error(format!("Cannot reload {}", self.source)));
            return;
        }
        match self.source.load() {
            Ok(text) => {
                self.set_diff(&text);
                self.status = Some(StatusMessage::info(format!("Reloaded {} files", self.file_count)));
            }
            Err(err) => {
                warn!(error = %err, "reload failed");
                self.status = Some(StatusMessage::error(err.to_string()));
            }
        }
    }

    fn highlighter_options(&self) -> HighlighterOptions {
        HighlighterOptions {
            dark_mode: self.theme.is_dark(),
            syntax_dir: self.syntax_dir.clone(),
        }
    }

    fn viewport(&self) -> ViewportState {
        ViewportState {
            scroll_top: self.scroll_top as f64,
            viewport_height: self.viewport_height,
            total_rows: self.rows.len(),
        }
    }

    fn max_scroll(&self) -> usize {
        max_scroll(self.rows.len(), self.viewport_height)
    }

    fn scroll_by(&mut self, delta: isize) {
        let target = self.scroll_top.saturating_add_signed(delta);
        self.scroll_to(target);
    }

    fn scroll_to(&mut self, top: usize) {
        self.scroll_top = top.min(self.max_scroll());
        self.anchor = self.scroll_top;
    }

    /// Put `target` at the top of the viewport, or report `missing`.
    fn jump(&mut self, target: Option<usize>, missing: &str) {
        match target {
            Some(index) => {
                self.scroll_top = index.min(self.max_scroll());
                self.anchor = index;
            }
            None => self.status = Some(StatusMessage::info(missing)),
        }
    }

    fn clamp_scroll(&mut self) {
        self.scroll_top = self.scroll_top.min(self.max_scroll());
    }

    /// Apply a new viewport height, keeping the anchor row on screen.
    fn resize(&mut self, height: usize) {
        self.viewport_height = height;
        self.clamp_scroll();
        if let Some(top) = scroll_into_view(
            self.anchor,
            self.scroll_top,
            self.viewport_height,
            self.rows.len(),
            SCROLL_MARGIN,
        ) {
            self.scroll_top = top;
        }
        self.dirty = true;
    }
}
