//! CLI module - Command-line interface definitions and handlers
//!
//! Uses clap v4 with derive macros for argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use output::OutputFormat;

pub mod commands;
pub mod output;

/// Zo Substrate - exchange skills between two workspaces through a shared git relay
#[derive(Parser, Debug)]
#[command(name = "substrate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// [DEPRECATED] Enable JSON output for machine consumption.
    /// Use --output-format=json or -m instead.
    #[arg(long, global = true, hide = true)]
    pub robot: bool,

    /// Output format (human, json, jsonl, plain, tsv)
    #[arg(long, short = 'O', global = true, value_enum)]
    pub output_format: Option<OutputFormat>,

    /// Enable machine-readable JSON output (shorthand for --output-format=json)
    #[arg(long, short = 'm', global = true)]
    pub machine: bool,

    /// Force plain output (no colors)
    #[arg(long, global = true)]
    pub plain: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file path (default: <workspace>/Skills/zo-substrate/config/substrate.yaml)
    #[arg(long, global = true, env = "SUBSTRATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Workspace root (default: /home/workspace, then the home directory)
    #[arg(long, global = true, env = "ZO_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Get the effective output format.
    ///
    /// Priority order:
    /// 1. `--plain` → Plain format
    /// 2. `--output-format` → Explicit format
    /// 3. `--machine` → JSON format (shorthand)
    /// 4. `--robot` → JSON format (deprecated)
    /// 5. Default → Human format
    #[must_use]
    pub fn output_format(&self) -> OutputFormat {
        if self.plain {
            return OutputFormat::Plain;
        }
        if let Some(fmt) = self.output_format {
            return fmt;
        }
        if self.machine || self.robot {
            return OutputFormat::Json;
        }
        OutputFormat::Human
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export local skills to the relay repository
    Push(commands::push::PushArgs),

    /// Install skills from the relay repository
    Pull(commands::pull::PullArgs),

    /// Show identities, last sync times and discoverable skills
    Status(commands::status::StatusArgs),

    /// Check prerequisites or write the initial configuration
    Setup(commands::setup::SetupArgs),

    /// Create, validate and list skill bundles
    Bundle(commands::bundle::BundleArgs),

    /// Refresh or query the local context snapshot
    Context(commands::context::ContextArgs),

    /// Survey the workspace and install a skill directory or bundle
    Install(commands::install::InstallArgs),
}
