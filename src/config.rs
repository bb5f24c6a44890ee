//! Command-line options and the viewer configuration derived from them.

use crate::keymap::Keymap;
use crate::source::DiffSource;
use crate::theme::Theme;
use crate::token_cache::DEFAULT_CAPACITY;
use crate::viewport::DEFAULT_OVERSCAN;
use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;

/// Environment variable naming a log file, used when `--log-file` is absent
pub const LOG_ENV: &str = "JJDIFF_LOG";

#[derive(Debug, Parser)]
#[command(
    name = "jjd",
    version,
    about = "Scrollable, syntax-highlighted diff viewer for jj repositories"
)]
pub struct Cli {
    /// Repository directory.
    #[arg(short = 'R', long = "repository", default_value = ".")]
    pub repository: PathBuf,

    /// Revision to show.
    #[arg(short, long, default_value = "@")]
    pub revision: String,

    /// Show uncommitted git changes instead of asking jj.
    #[arg(long, conflicts_with = "diff_file")]
    pub git: bool,

    /// Read a unified diff from a file. Use '-' to read from stdin.
    #[arg(long, value_name = "PATH")]
    pub diff_file: Option<String>,

    #[arg(long, value_enum, default_value_t = Theme::Dark)]
    pub theme: Theme,

    /// Rows rendered beyond each viewport edge.
    #[arg(long, default_value_t = DEFAULT_OVERSCAN)]
    pub overscan: usize,

    /// Highlighted lines kept in memory.
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    pub cache_capacity: usize,

    /// Folder of extra .sublime-syntax definitions.
    #[arg(long, value_name = "DIR")]
    pub syntax_dir: Option<PathBuf>,

    /// Override a keybinding, e.g. `next-hunk=ctrl+n`. Repeatable.
    #[arg(long = "bind", value_name = "ACTION=KEYS")]
    pub bindings: Vec<String>,

    /// Append logs to this file.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// Everything the viewer needs to run.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub source: DiffSource,
    pub theme: Theme,
    pub overscan: usize,
    pub cache_capacity: usize,
    pub syntax_dir: Option<PathBuf>,
    pub keymap: Keymap,
}

impl ViewerConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let source = match (&cli.diff_file, cli.git) {
            (Some(path), _) if path == "-" => DiffSource::Stdin,
            (Some(path), _) => DiffSource::File(PathBuf::from(path)),
            (None, true) => DiffSource::Git {
                repo: cli.repository.clone(),
            },
            (None, false) => DiffSource::Jj {
                repo: cli.repository.clone(),
                revision: cli.revision.clone(),
            },
        };

        let mut keymap = Keymap::default();
        for binding in &cli.bindings {
            keymap.apply_override(binding).map_err(|e| anyhow!("--bind {binding}: {e}"))?;
        }

        Ok(ViewerConfig {
            source,
            theme: cli.theme,
            overscan: cli.overscan,
            cache_capacity: cli.cache_capacity,
            syntax_dir: cli.syntax_dir.clone(),
            keymap,
        })
    }
}

/// Log destination: the flag wins over the environment.
pub fn log_path(cli: &Cli) -> Option<PathBuf> {
    cli.log_file
        .clone()
        .or_else(|| std::env::var_os(LOG_ENV).map(PathBuf::from))
}
