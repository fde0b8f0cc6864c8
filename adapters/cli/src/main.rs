#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that pits the Rampart decision engine against seeded waves.

mod args;
mod session;
mod settings;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::{args::Cli, session::RunOptions, settings::Settings};

/// Entry point for the Rampart command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut settings = Settings::load(cli.config.as_deref())?;
    settings.apply_overrides(&cli);
    settings.validate()?;

    let options = RunOptions::from(&cli);
    tracing::info!(
        seed = options.seed,
        waves = options.waves,
        profile = ?settings.planner.profile,
        "starting session"
    );
    let summary = session::run(&settings, &options)?;
    println!("{summary}");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
