//! Keybinding strings, parsing and resolution to viewer actions.
//!
//! A binding string is a comma-separated list of alternatives, each a
//! `+`-joined chord such as `ctrl+d`, `shift+tab`, `G` or `pagedown`.
//! The string `none` unbinds an action.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::fmt;
use std::str::FromStr;

/// Actions the diff viewer can perform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    ScrollDown,
    ScrollUp,
    PageDown,
    PageUp,
    HalfPageDown,
    HalfPageUp,
    Top,
    Bottom,
    NextHunk,
    PrevHunk,
    NextFile,
    PrevFile,
    Reload,
    ToggleTheme,
    Log,
    Select,
    Help,
    Quit,
}

impl Action {
    pub const ALL: [Action; 18] = [
        Action::ScrollDown,
        Action::ScrollUp,
        Action::PageDown,
        Action::PageUp,
        Action::HalfPageDown,
        Action::HalfPageUp,
        Action::Top,
        Action::Bottom,
        Action::NextHunk,
        Action::PrevHunk,
        Action::NextFile,
        Action::PrevFile,
        Action::Reload,
        Action::ToggleTheme,
        Action::Log,
        Action::Select,
        Action::Help,
        Action::Quit,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Action::ScrollDown => "scroll-down",
            Action::ScrollUp => "scroll-up",
            Action::PageDown => "page-down",
            Action::PageUp => "page-up",
            Action::HalfPageDown => "half-page-down",
            Action::HalfPageUp => "half-page-up",
            Action::Top => "top",
            Action::Bottom => "bottom",
            Action::NextHunk => "next-hunk",
            Action::PrevHunk => "prev-hunk",
            Action::NextFile => "next-file",
            Action::PrevFile => "prev-file",
            Action::Reload => "reload",
            Action::ToggleTheme => "toggle-theme",
            Action::Log => "log",
            Action::Select => "select",
            Action::Help => "help",
            Action::Quit => "quit",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Action::ScrollDown => "Scroll down one row",
            Action::ScrollUp => "Scroll up one row",
            Action::PageDown => "Page down",
            Action::PageUp => "Page up",
            Action::HalfPageDown => "Half page down",
            Action::HalfPageUp => "Half page up",
            Action::Top => "Jump to top",
            Action::Bottom => "Jump to bottom",
            Action::NextHunk => "Next hunk",
            Action::PrevHunk => "Previous hunk",
            Action::NextFile => "Next file",
            Action::PrevFile => "Previous file",
            Action::Reload => "Reload diff",
            Action::ToggleTheme => "Toggle theme",
            Action::Log => "Pick a change from jj log",
            Action::Select => "Show the picked change",
            Action::Help => "Toggle help",
            Action::Quit => "Quit",
        }
    }

    fn default_keys(self) -> &'static str {
        match self {
            Action::ScrollDown => "j,down",
            Action::ScrollUp => "k,up",
            Action::PageDown => "pagedown,space,ctrl+f",
            Action::PageUp => "pageup,ctrl+b",
            Action::HalfPageDown => "ctrl+d",
            Action::HalfPageUp => "ctrl+u",
            Action::Top => "g,home",
            Action::Bottom => "G,end",
            Action::NextHunk => "n,]",
            Action::PrevHunk => "N,[",
            Action::NextFile => "},tab",
            Action::PrevFile => "{,shift+tab",
            Action::Reload => "r",
            Action::ToggleTheme => "t",
            Action::Log => "l",
            Action::Select => "enter",
            Action::Help => "?",
            Action::Quit => "q,esc,ctrl+c",
        }
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| format!("unknown action `{s}`"))
    }
}

/// One key chord with its modifiers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyBinding {
    pub name: String,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

/// Parse a binding string into its alternatives.
pub fn parse(keys: &str) -> Vec<KeyBinding> {
    if keys == "none" {
        return Vec::new();
    }

    keys.split(',')
        .filter(|combo| !combo.is_empty())
        .map(|combo| {
            let mut info = KeyBinding::default();
            // A lone "+" is the plus key, not a separator
            let parts: Vec<&str> = if combo == "+" {
                vec!["+"]
            } else {
                combo.split('+').collect()
            };
            for part in parts {
                let lower = part.to_lowercase();
                match lower.as_str() {
                    "ctrl" => info.ctrl = true,
                    "alt" | "meta" | "option" => info.alt = true,
                    "shift" => info.shift = true,
                    "esc" => info.name = "escape".to_string(),
                    "return" => info.name = "enter".to_string(),
                    _ => {
                        if part.chars().count() == 1 && part != lower {
                            info.shift = true;
                        }
                        info.name = lower;
                    }
                }
            }
            info
        })
        .collect()
}

/// Normalize a crossterm key event into the binding form.
pub fn from_key_event(key: &KeyEvent) -> KeyBinding {
    let mut shift = key.modifiers.contains(KeyModifiers::SHIFT);
    let name = match key.code {
        KeyCode::Char(' ') => "space".to_string(),
        KeyCode::Char(c) => {
            if c.is_uppercase() {
                shift = true;
            }
            c.to_lowercase().to_string()
        }
        KeyCode::Enter => "enter".to_string(),
        KeyCode::Esc => "escape".to_string(),
        KeyCode::Tab => "tab".to_string(),
        KeyCode::BackTab => {
            shift = true;
            "tab".to_string()
        }
        KeyCode::Backspace => "backspace".to_string(),
        KeyCode::Delete => "delete".to_string(),
        KeyCode::Up => "up".to_string(),
        KeyCode::Down => "down".to_string(),
        KeyCode::Left => "left".to_string(),
        KeyCode::Right => "right".to_string(),
        KeyCode::Home => "home".to_string(),
        KeyCode::End => "end".to_string(),
        KeyCode::PageUp => "pageup".to_string(),
        KeyCode::PageDown => "pagedown".to_string(),
        KeyCode::F(n) => format!("f{n}"),
        _ => String::new(),
    };

    // Symbols like `?`, `{` and `}` arrive with SHIFT on some terminals
    if let KeyCode::Char(c) = key.code {
        if !c.is_alphabetic() {
            shift = false;
        }
    }

    KeyBinding {
        name,
        ctrl: key.modifiers.contains(KeyModifiers::CONTROL),
        alt: key.modifiers.contains(KeyModifiers::ALT),
        shift,
    }
}

impl KeyBinding {
    pub fn matches(&self, key: &KeyEvent) -> bool {
        *self == from_key_event(key)
    }
}

impl fmt::Display for KeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        if self.ctrl {
            parts.push("ctrl".to_string());
        }
        if self.alt {
            parts.push("alt".to_string());
        }

        let is_single_letter = self.name.len() == 1 && self.name.chars().all(|c| c.is_ascii_lowercase());
        if self.shift && !is_single_letter {
            parts.push("shift".to_string());
        }

        if !self.name.is_empty() {
            let name = match self.name.as_str() {
                "delete" => "del".to_string(),
                "escape" => "esc".to_string(),
                n if self.shift && is_single_letter => n.to_uppercase(),
                n => n.to_string(),
            };
            parts.push(name);
        }

        write!(f, "{}", parts.join("+"))
    }
}

/// Action → bindings table.
#[derive(Clone, Debug)]
pub struct Keymap {
    bindings: Vec<(Action, Vec<KeyBinding>)>,
}

impl Default for Keymap {
    fn default() -> Self {
        Keymap {
            bindings: Action::ALL
                .into_iter()
                .map(|a| (a, parse(a.default_keys())))
                .collect(),
        }
    }
}

impl Keymap {
    /// Apply an `ACTION=KEYS` override, replacing that action's bindings.
    pub fn apply_override(&mut self, binding: &str) -> Result<(), String> {
        let (action, keys) = binding
            .split_once('=')
            .ok_or_else(|| format!("expected ACTION=KEYS, got `{binding}`"))?;
        let action: Action = action.trim().parse()?;
        let keys = parse(keys.trim());
        if let Some(entry) = self.bindings.iter_mut().find(|(a, _)| *a == action) {
            entry.1 = keys;
        }
        Ok(())
    }

    /// Action bound to `key`, if any. Earlier actions win on conflicts.
    pub fn resolve(&self, key: &KeyEvent) -> Option<Action> {
        let pressed = from_key_event(key);
        self.bindings
            .iter()
            .find(|(_, keys)| keys.contains(&pressed))
            .map(|(action, _)| *action)
    }

    /// Display form of an action's keys, e.g. `j/down`.
    pub fn keys_label(&self, action: Action) -> String {
        self.bindings
            .iter()
            .find(|(a, _)| *a == action)
            .map(|(_, keys)| keys.iter().map(|k| k.to_string()).collect::<Vec<_>>().join("/"))
            .unwrap_or_default()
    }
}
