//! Command-line interface definitions.

use crate::pipeline::Stage;
use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Front-end asset pipeline: compile, copy, revision, rewrite, inline, deploy
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Build output directory (relative to project root, overrides BUILD_DIR)
    #[arg(short, long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Source root (relative to project root, overrides SOURCE_ROOT)
    #[arg(short, long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub source: Option<PathBuf>,

    /// Config file path (default: revline.toml)
    #[arg(short = 'C', long, global = true, default_value = "revline.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Development mode: compile into the source tree with source maps
    #[arg(short, long, global = true)]
    pub dev: bool,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the full pipeline
    #[command(visible_alias = "b")]
    Build {
        /// Keep the existing build directory contents
        #[arg(long)]
        no_clean: bool,
    },

    /// Run a single stage against the current build directory
    #[command(visible_alias = "r")]
    Run {
        #[arg(value_enum)]
        stage: Stage,
    },

    /// Build, then hand the build directory to the deploy transport
    #[command(visible_alias = "d")]
    Deploy {
        /// Force push (overwrites remote history)
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        force: Option<bool>,

        /// Deploy the existing build directory without rebuilding
        #[arg(long)]
        skip_build: bool,
    },

    /// Empty the build directory (keeps `.git*` entries)
    Clean,

    /// Validate configuration and external tools without building
    Check,
}

impl Cli {
    pub const fn is_deploy(&self) -> bool {
        matches!(self.command, Commands::Deploy { .. })
    }
}
