mod config;
mod diff;
mod error;
mod git;
mod highlighting;
mod jj;
mod keymap;
mod language;
mod log;
mod models;
mod rows;
mod session;
mod source;
mod text;
mod theme;
mod token_cache;
mod ui;
mod viewer;
mod viewport;
mod worker;

use anyhow::{Context, Result};
use clap::Parser;
use config::{Cli, ViewerConfig};
use std::fs::File;
use std::panic;
use std::path::Path;
use std::sync::Mutex;
use viewer::Viewer;

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Some(path) = config::log_path(&cli) {
        init_tracing(&path)?;
    }

    let config = ViewerConfig::from_cli(&cli)?;
    let text = config
        .source
        .load()
        .with_context(|| format!("failed to load diff from {}", config.source))?;
    tracing::info!(source = %config.source, bytes = text.len(), "starting viewer");

    install_panic_hook();
    let mut viewer = Viewer::new(config, &text);
    viewer.run().context("terminal error")?;
    Ok(())
}

fn init_tracing(log_path: &Path) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let file = File::options()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("cannot open log file {}", log_path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .map_err(|error| anyhow::anyhow!(error))?;

    Ok(())
}

/// Leave raw mode and the alternate screen before the panic message prints.
fn install_panic_hook() {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let _ = crossterm::terminal::disable_raw_mode();
        let _ = crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::cursor::Show
        );
        default_hook(info);
    }));
}
