//! substrate push - Export local skills to the relay

use std::process::ExitCode;

use clap::Args;

use super::{exit_code, skill_filter};
use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_machine};
use crate::error::Result;
use crate::sync::{PushReport, SyncEngine, SyncOptions};

#[derive(Args, Debug, Default)]
pub struct PushArgs {
    /// Only push these skills (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub skills: Vec<String>,

    /// Show what would be pushed without cloning or committing
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(ctx: &AppContext, args: &PushArgs) -> Result<ExitCode> {
    let config = ctx.config()?;
    let options = SyncOptions {
        skills: skill_filter(&args.skills),
        dry_run: args.dry_run,
    };
    let report = SyncEngine::with_git(&config, &ctx.env).push(&options)?;

    if ctx.robot_mode {
        emit_machine(&report, ctx.output_format)?;
    } else {
        emit_human(render(&report, &config.substrate.repo));
    }
    Ok(exit_code(report.success))
}

fn render(report: &PushReport, repo: &str) -> HumanLayout {
    let mut layout = HumanLayout::new();
    layout.title(&format!("Push to {repo}"));

    if let Some(error) = report.error {
        layout.fail(&format!(
            "{error}: {}",
            report.detail.as_deref().unwrap_or_default()
        ));
        if !report.available.is_empty() {
            layout.push_line("Available skills:");
            for name in &report.available {
                layout.bullet(name);
            }
        }
        return layout;
    }

    if report.dry_run {
        layout.push_line("[DRY RUN] Would push:");
        for name in &report.planned {
            layout.bullet(name);
        }
        return layout;
    }

    if let Some(message) = &report.message {
        layout.ok(message);
    }
    if !report.copied.is_empty() {
        layout.push_line(format!("Pushed {} skill(s):", report.copied.len()));
        for name in &report.copied {
            layout.bullet(name);
        }
    }
    if !report.unchanged.is_empty() {
        layout.kv("Unchanged", &report.unchanged.join(", "));
    }
    if !report.skipped.is_empty() {
        layout.warn(&format!("Skipped: {}", report.skipped.join(", ")));
    }
    if let Some(commit) = &report.commit {
        layout.kv("Commit", commit);
    }
    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::SyncFailure;

    #[test]
    fn render_no_match_lists_available() {
        console::set_colors_enabled(false);
        let mut report = PushReport::failed(SyncFailure::NoMatch, "No skills matched: ghost");
        report.available = vec!["alpha".into()];
        let text = render(&report, "o/r").build();
        assert!(text.contains("no_match: No skills matched: ghost"));
        assert!(text.contains("  - alpha"));
    }

    #[test]
    fn render_dry_run() {
        console::set_colors_enabled(false);
        let report = PushReport {
            success: true,
            dry_run: true,
            planned: vec!["alpha".into(), "beta".into()],
            ..PushReport::default()
        };
        let text = render(&report, "o/r").build();
        assert!(text.contains("[DRY RUN] Would push:"));
        assert!(text.contains("  - beta"));
    }
}
