//! Line tokenizer built on syntect with a built-in Alabaster-style theme.
//!
//! A `Tokenizer` is heavy to build (grammar loading) and is owned by exactly
//! one tokenization worker thread.

use crate::error::WorkerInitError;
use crate::models::{spans_text, TokenSpan};
use crossterm::style::Color as CrosstermColor;
use std::path::PathBuf;
use std::str::FromStr;
use syntect::easy::HighlightLines;
use syntect::highlighting::{
    Color, FontStyle, ScopeSelectors, StyleModifier, Theme, ThemeItem, ThemeSettings,
};
use syntect::parsing::SyntaxSet;

/// Lines longer than this are returned unstyled
pub const MAX_LINE_LENGTH: usize = 2000;

/// What the worker loads at startup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HighlighterOptions {
    pub dark_mode: bool,
    /// Extra `.sublime-syntax` definitions added on top of the defaults
    pub syntax_dir: Option<PathBuf>,
}

pub struct Tokenizer {
    syntax_set: SyntaxSet,
    theme: Theme,
}

impl Tokenizer {
    /// Load grammars and build the theme. This is the one-time setup cost.
    pub fn load(options: &HighlighterOptions) -> Result<Self, WorkerInitError> {
        let syntax_set = match &options.syntax_dir {
            None => SyntaxSet::load_defaults_newlines(),
            Some(dir) => {
                if !dir.is_dir() {
                    return Err(WorkerInitError::MissingSyntaxDir(dir.display().to_string()));
                }
                let mut builder = SyntaxSet::load_defaults_newlines().into_builder();
                builder.add_from_folder(dir, true)?;
                builder.build()
            }
        };
        let theme = if options.dark_mode {
            alabaster_dark()?
        } else {
            alabaster_light()?
        };

        Ok(Tokenizer { syntax_set, theme })
    }

    /// Whether a grammar is loaded for `language` (extension or syntax name).
    pub fn is_loaded(&self, language: &str) -> bool {
        self.syntax_set.find_syntax_by_token(language).is_some()
    }

    /// Split `content` into colored spans.
    ///
    /// Unknown languages and overly long lines yield one unstyled span. The
    /// concatenated span text always equals `content`.
    pub fn tokenize(&self, content: &str, language: &str) -> Result<Vec<TokenSpan>, syntect::Error> {
        let Some(syntax) = self.syntax_set.find_syntax_by_token(language) else {
            return Ok(vec![TokenSpan::plain(content)]);
        };
        if content.len() > MAX_LINE_LENGTH {
            return Ok(vec![TokenSpan::plain(content)]);
        }

        // Newline syntaxes expect a terminated line
        let line = format!("{content}\n");
        let mut h = HighlightLines::new(syntax, &self.theme);
        let ranges = h.highlight_line(&line, &self.syntax_set)?;

        let mut spans = Vec::with_capacity(ranges.len());
        let mut consumed = 0;
        for (style, text) in ranges {
            let remaining = content.len() - consumed;
            if remaining == 0 {
                break;
            }
            let take = text.len().min(remaining);
            let piece = &text[..take];
            consumed += take;
            if piece.is_empty() {
                continue;
            }
            spans.push(TokenSpan {
                content: piece.to_string(),
                color: Some(to_crossterm_color(style.foreground)),
            });
        }

        if spans.is_empty() || spans_text(&spans) != content {
            return Ok(vec![TokenSpan::plain(content)]);
        }
        Ok(spans)
    }
}

pub fn to_crossterm_color(c: Color) -> CrosstermColor {
    CrosstermColor::Rgb {
        r: c.r,
        g: c.g,
        b: c.b,
    }
}

// ============================================================================
// Theme
// ============================================================================

struct Palette {
    bg: Color,
    fg: Color,
    comment: Color,
    string: Color,
    constant: Color,
    definition: Color,
    punctuation: Color,
}

const fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color { r, g, b, a: 255 }
}

fn alabaster_dark() -> Result<Theme, WorkerInitError> {
    build_theme(
        "Alabaster Dark",
        &Palette {
            bg: rgb(14, 20, 21),
            fg: rgb(206, 206, 206),
            comment: rgb(223, 148, 84),
            string: rgb(149, 203, 130),
            constant: rgb(204, 140, 188),
            definition: rgb(120, 160, 255),
            punctuation: rgb(119, 119, 119),
        },
    )
}

fn alabaster_light() -> Result<Theme, WorkerInitError> {
    build_theme(
        "Alabaster Light",
        &Palette {
            bg: rgb(247, 247, 247),
            fg: rgb(0, 0, 0),
            comment: rgb(170, 55, 49),
            string: rgb(68, 140, 39),
            constant: rgb(122, 62, 157),
            definition: rgb(50, 92, 192),
            punctuation: rgb(119, 119, 119),
        },
    )
}

fn build_theme(name: &str, palette: &Palette) -> Result<Theme, WorkerInitError> {
    let settings = ThemeSettings {
        background: Some(palette.bg),
        foreground: Some(palette.fg),
        caret: Some(palette.fg),
        ..ThemeSettings::default()
    };

    // Keywords are deliberately left at the default foreground
    let scopes = vec![
        scope_item("comment", palette.comment, FontStyle::empty())?,
        scope_item("string", palette.string, FontStyle::empty())?,
        scope_item(
            "constant.numeric, constant.language, constant.character",
            palette.constant,
            FontStyle::empty(),
        )?,
        scope_item(
            "entity.name, entity.name.function, entity.name.type",
            palette.definition,
            FontStyle::empty(),
        )?,
        scope_item("punctuation", palette.punctuation, FontStyle::empty())?,
        scope_item("markup.heading, markup.bold", palette.fg, FontStyle::BOLD)?,
    ];

    Ok(Theme {
        name: Some(name.to_string()),
        author: None,
        settings,
        scopes,
    })
}

fn scope_item(selector: &str, foreground: Color, font_style: FontStyle) -> Result<ThemeItem, WorkerInitError> {
    Ok(ThemeItem {
        scope: ScopeSelectors::from_str(selector)?,
        style: StyleModifier {
            foreground: Some(foreground),
            background: None,
            font_style: Some(font_style),
        },
    })
}
