mod camera;
mod config;
mod error;
mod exhibit;
mod hall;
mod input;
mod nbody;
mod panel;
mod render;
mod resolver;
mod scene;
mod scheduler;
mod terminal;
mod viewport;

use anyhow::Context;
use clap::Parser;
use config::{Cli, HallConfig};
use hall::Hall;
use render::Renderer;
use std::fs::File;
use std::io::{self, BufWriter};
use std::sync::Mutex;
use terminal::{EventTranslator, TerminalGuard};
use tracing::info;

/// Logs go to a file or nowhere; stdout belongs to the renderer
fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let Some(path) = &cli.log_file else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    let level: tracing::Level = cli.log_level.into();
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

/// Main function
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let viewport = terminal::probe_viewport();
    let config = HallConfig::from_cli(&cli, &viewport).context("invalid options")?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        tier = ?config.tier,
        fps = cli.fps,
        "starting"
    );

    let mut hall = Hall::new(config.clone(), viewport);
    let guard = TerminalGuard::enter().context("failed to set up the terminal")?;
    let mut translator = EventTranslator::new(config.tier, viewport, guard.reports_releases());
    let mut renderer = Renderer::new(
        BufWriter::new(io::stdout()),
        config.settings.supersample,
    );

    let result = terminal::run(&mut hall, &mut renderer, &mut translator);
    drop(guard);
    result.context("the hall stopped unexpectedly")?;
    Ok(())
}
