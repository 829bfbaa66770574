//! substrate pull - Install skills from the relay

use std::process::ExitCode;

use clap::Args;

use super::{exit_code, skill_filter};
use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_machine};
use crate::error::Result;
use crate::sync::{PullReport, SyncEngine, SyncOptions};

/// Pass the global `--verbose` flag to also print the relay manifest.
#[derive(Args, Debug, Default)]
pub struct PullArgs {
    /// Only pull these skills (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub skills: Vec<String>,

    /// List [NEW]/[UPDATE] actions without installing anything
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(ctx: &AppContext, args: &PullArgs) -> Result<ExitCode> {
    let config = ctx.config()?;
    let options = SyncOptions {
        skills: skill_filter(&args.skills),
        dry_run: args.dry_run,
    };
    let report = SyncEngine::with_git(&config, &ctx.env).pull(&options)?;

    if ctx.robot_mode {
        emit_machine(&report, ctx.output_format)?;
    } else {
        emit_human(render(&report, &config.substrate.repo, ctx.verbosity > 0));
    }
    Ok(exit_code(report.success))
}

fn render(report: &PullReport, repo: &str, show_manifest: bool) -> HumanLayout {
    let mut layout = HumanLayout::new();
    layout.title(&format!("Pull from {repo}"));

    for warning in &report.warnings {
        layout.warn(warning);
    }

    if let Some(manifest) = report.manifest.as_ref().filter(|_| show_manifest) {
        layout
            .section("Relay manifest")
            .kv("Source", &manifest.source)
            .kv("Generated", &manifest.generated_at)
            .kv("Git SHA", &manifest.git_sha)
            .kv("Skills", &manifest.exported_skills.join(", "))
            .blank();
    }

    if let Some(error) = report.error {
        layout.fail(&format!(
            "{error}: {}",
            report.detail.as_deref().unwrap_or_default()
        ));
        if !report.available.is_empty() {
            layout.push_line("Available in relay:");
            for name in &report.available {
                layout.bullet(name);
            }
        }
        return layout;
    }

    if report.dry_run {
        layout.push_line("[DRY RUN] Would install:");
        for planned in &report.planned {
            layout.bullet(&format!("{} {}", planned.action.label(), planned.name));
        }
        return layout;
    }

    if let Some(message) = &report.message {
        layout.ok(message);
    }
    if !report.installed.is_empty() {
        layout.push_line(format!("Installed {} skill(s):", report.installed.len()));
        for name in &report.installed {
            layout.bullet(name);
        }
    }
    for backup in &report.backups {
        layout.kv("Backup", &format!("{} -> {}", backup.skill, backup.path.display()));
    }
    if !report.replaced.is_empty() {
        layout.kv("Replaced", &report.replaced.join(", "));
    }
    for failure in &report.failed {
        layout.fail(&format!("{}: {}", failure.skill, failure.reason));
    }
    if let Some(sha) = &report.substrate_sha {
        layout.kv("Relay SHA", sha);
    }
    layout
}
