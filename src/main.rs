//! substrate - Zo Substrate CLI
//!
//! Exchange skills between two workspaces through a shared git relay.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use zo_substrate::app::AppContext;
use zo_substrate::cli::output::{emit_machine, error_response};
use zo_substrate::cli::{Cli, commands};
use zo_substrate::Result;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    let format = cli.output_format();
    if !format.use_colors() {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            if format.is_machine_readable() {
                // Machine mode: structured error on stdout
                if emit_machine(&error_response(&e), format).is_err() {
                    eprintln!("Error: {e}");
                }
            } else {
                eprintln!("Error: {e}");
                eprintln!("Hint: {}", e.code().suggestion());
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let ctx = AppContext::from_cli(cli);
    commands::run(&ctx, &cli.command)
}

fn init_tracing(cli: &Cli) {
    if cli.quiet {
        return;
    }

    let filter = match cli.verbose {
        0 => "warn,zo_substrate=info",
        1 => "info,zo_substrate=debug",
        2 => "debug,zo_substrate=trace",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_env("SUBSTRATE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(filter));

    if cli.output_format().is_machine_readable() {
        // JSON logging for machine mode
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        // Human-readable logging
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().without_time().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
