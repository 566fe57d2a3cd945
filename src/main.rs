//! Revline - front-end asset pipeline for CMS projects.

mod cli;
mod config;
mod core;
mod hooks;
mod logger;
mod pipeline;
mod rev;
mod stage;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::PipelineConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = PipelineConfig::load(&cli)?;
    debug!("config"; "root {}, {} mode", config.root().display(), config.mode);

    match &cli.command {
        Commands::Build { .. } => {
            config.validate(false)?;
            cli::build::build(&config)?;
        }
        Commands::Run { stage } => {
            cli::build::run_stage(&config, *stage)?;
        }
        Commands::Deploy { skip_build, .. } => {
            config.validate(true)?;
            cli::build::deploy(&config, *skip_build)?;
        }
        Commands::Clean => {
            let removed = stage::clean_build_dir(config.build_dir())?;
            log!("clean"; "{} removed from {}", logger::plural_count(removed, "item"), config.build_dir().display());
        }
        Commands::Check => {
            config.validate(true)?;
            log!("check"; "configuration is valid");
        }
    }
    Ok(())
}
