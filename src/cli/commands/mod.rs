//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - `run()` function to execute the command, returning the process exit code

use std::process::ExitCode;

use crate::app::AppContext;
use crate::cli::Commands;
use crate::error::Result;

pub mod bundle;
pub mod context;
pub mod install;
pub mod pull;
pub mod push;
pub mod setup;
pub mod status;

/// Dispatch a command to its handler
pub fn run(ctx: &AppContext, command: &Commands) -> Result<ExitCode> {
    match command {
        Commands::Push(args) => push::run(ctx, args),
        Commands::Pull(args) => pull::run(ctx, args),
        Commands::Status(args) => status::run(ctx, args),
        Commands::Setup(args) => setup::run(ctx, args),
        Commands::Bundle(args) => bundle::run(ctx, args),
        Commands::Context(args) => context::run(ctx, args),
        Commands::Install(args) => install::run(ctx, args),
    }
}

/// Exit 0 on success, 1 on any reported failure.
pub(crate) fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// `None` when no names were given, so the whole set applies.
pub(crate) fn skill_filter(names: &[String]) -> Option<Vec<String>> {
    let names: Vec<String> = names
        .iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();
    (!names.is_empty()).then_some(names)
}
