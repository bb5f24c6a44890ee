use clap::ValueEnum;
use crossterm::style::Color;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Theme {
    Dark,
    Light,
}

#[derive(Clone, Copy)]
pub struct ColorScheme {
    pub bg: Color,
    pub fg: Color,
    pub line_number_fg: Color,
    // File header rows
    pub header_bg: Color,
    pub header_fg: Color,
    // Collapsed gap rows
    pub gap_fg: Color,
    // Diff content
    pub diff_added_bg: Color,
    pub diff_removed_bg: Color,
    pub diff_added_marker: Color,
    pub diff_removed_marker: Color,
    // Status bar
    pub status_bg: Color,
    pub status_fg: Color,
    pub status_accent_bg: Color,
    pub status_accent_fg: Color,
    pub error_fg: Color,
    pub error_bg: Color,
    // Help overlay
    pub help_bg: Color,
    pub help_fg: Color,
}

impl Theme {
    pub fn is_dark(self) -> bool {
        self == Theme::Dark
    }

    pub fn toggled(self) -> Theme {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn colors(&self) -> ColorScheme {
        match self {
            Theme::Dark => ColorScheme {
                bg: Color::Rgb { r: 14, g: 20, b: 21 },
                fg: Color::Rgb {
                    r: 206,
                    g: 206,
                    b: 206,
                },
                line_number_fg: Color::Rgb {
                    r: 120,
                    g: 120,
                    b: 120,
                },
                header_bg: Color::Rgb { r: 40, g: 48, b: 56 },
                header_fg: Color::Rgb {
                    r: 230,
                    g: 230,
                    b: 160,
                },
                gap_fg: Color::Rgb {
                    r: 100,
                    g: 140,
                    b: 180,
                },
                // Pale green/red backgrounds
                diff_added_bg: Color::Rgb { r: 30, g: 50, b: 30 },
                diff_removed_bg: Color::Rgb { r: 50, g: 30, b: 30 },
                diff_added_marker: Color::Rgb {
                    r: 100,
                    g: 200,
                    b: 100,
                },
                diff_removed_marker: Color::Rgb {
                    r: 200,
                    g: 100,
                    b: 100,
                },
                status_bg: Color::DarkGrey,
                status_fg: Color::White,
                status_accent_bg: Color::Rgb {
                    r: 200,
                    g: 120,
                    b: 50,
                },
                status_accent_fg: Color::Black,
                error_fg: Color::White,
                error_bg: Color::Rgb { r: 150, g: 50, b: 50 },
                help_bg: Color::Rgb { r: 50, g: 70, b: 90 },
                help_fg: Color::Yellow,
            },
            Theme::Light => ColorScheme {
                bg: Color::Rgb {
                    r: 247,
                    g: 247,
                    b: 247,
                },
                fg: Color::Black,
                line_number_fg: Color::Rgb { r: 80, g: 80, b: 80 },
                header_bg: Color::Rgb {
                    r: 220,
                    g: 226,
                    b: 232,
                },
                header_fg: Color::Rgb { r: 40, g: 40, b: 120 },
                gap_fg: Color::Rgb {
                    r: 60,
                    g: 100,
                    b: 160,
                },
                diff_added_bg: Color::Rgb {
                    r: 220,
                    g: 255,
                    b: 220,
                },
                diff_removed_bg: Color::Rgb {
                    r: 255,
                    g: 220,
                    b: 220,
                },
                diff_added_marker: Color::Rgb { r: 30, g: 130, b: 30 },
                diff_removed_marker: Color::Rgb { r: 170, g: 40, b: 40 },
                status_bg: Color::Rgb {
                    r: 100,
                    g: 100,
                    b: 100,
                },
                status_fg: Color::White,
                status_accent_bg: Color::Rgb {
                    r: 230,
                    g: 150,
                    b: 70,
                },
                status_accent_fg: Color::Black,
                error_fg: Color::White,
                error_bg: Color::Rgb { r: 200, g: 60, b: 60 },
                help_bg: Color::Rgb {
                    r: 180,
                    g: 210,
                    b: 240,
                },
                help_fg: Color::Rgb { r: 50, g: 50, b: 150 },
            },
        }
    }
}
