//! Main entry point for the geoip-rs CLI tool

use anyhow::Context;
use clap::Parser;
use geoip_rs::cli::{Cli, Command};
use log::{LevelFilter, info};

fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG still applies, --verbose raises this crate to debug
    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.verbose {
        logger.filter_module("geoip_rs", LevelFilter::Debug);
    }
    logger.init();

    info!("Starting geoip-rs v{}", env!("CARGO_PKG_VERSION"));

    let action = match cli.command {
        Command::Server(_) => "server",
        Command::Lookup(_) => "lookup",
    };

    cli.run().with_context(|| format!("{} failed", action))?;

    Ok(())
}
