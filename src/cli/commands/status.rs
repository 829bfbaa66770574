//! substrate status - Identities, last syncs and discoverable skills

use std::process::ExitCode;

use clap::Args;

use crate::app::AppContext;
use crate::cli::OutputFormat;
use crate::cli::output::{HumanLayout, emit_human, emit_machine, emit_tsv, or_never};
use crate::context::{StatusReport, status};
use crate::error::Result;

#[derive(Args, Debug, Default)]
pub struct StatusArgs {}

pub fn run(ctx: &AppContext, _args: &StatusArgs) -> Result<ExitCode> {
    let config = ctx.config()?;
    let report = status(&config, &ctx.env)?;

    match ctx.output_format {
        OutputFormat::Tsv => emit_tsv(&["skill"], &report.skills, |name| vec![name.clone()]),
        format if format.is_machine_readable() => emit_machine(&report, format)?,
        _ => emit_human(render(&report)),
    }
    Ok(ExitCode::SUCCESS)
}

fn render(report: &StatusReport) -> HumanLayout {
    let mut layout = HumanLayout::new();
    layout
        .title("Zo Substrate Status")
        .kv("Identity", &report.identity)
        .kv("Partner", &report.partner)
        .kv("Relay", &format!("{} ({})", report.repo, report.branch))
        .blank();

    layout
        .section("Last push")
        .kv("When", &or_never(report.last_push.last_push.as_deref()));
    if !report.last_push.pushed_skills.is_empty() {
        layout.kv("Skills", &report.last_push.pushed_skills.join(", "));
    }
    layout.blank();

    layout
        .section("Last pull")
        .kv("When", &or_never(report.last_pull.last_pull.as_deref()));
    if !report.last_pull.pulled_skills.is_empty() {
        layout.kv("Skills", &report.last_pull.pulled_skills.join(", "));
    }
    if let Some(source) = &report.last_pull.source {
        layout.kv("From", source);
    }
    layout.blank();

    layout.section(&format!("Discoverable skills ({})", report.skills.len()));
    for name in &report.skills {
        layout.bullet(name);
    }

    if !report.recent_events.is_empty() {
        layout.blank().section("Recent events");
        for event in &report.recent_events {
            layout.bullet(&format!("{} {}", event.timestamp, event.event));
        }
    }
    layout
}
