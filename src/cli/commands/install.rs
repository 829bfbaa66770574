//! substrate install - Survey, plan, approve and execute a skill install

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use serde::Serialize;
use tracing::debug;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_machine};
use crate::config::SubstrateConfig;
use crate::error::{Result, SubstrateError};
use crate::install::{
    ExecutionReport, InstallPlan, Severity, Survey, build_plan, execute, prepare, survey,
};

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Skill directory or bundle (.tar.gz) to install
    pub source: PathBuf,

    /// Only survey the workspace
    #[arg(long, conflicts_with = "plan")]
    pub survey: bool,

    /// Show the survey and plan without installing
    #[arg(long)]
    pub plan: bool,

    /// Approve conflicting changes without prompting
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Preview the steps without changing anything
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Serialize)]
struct PlanOutput<'a> {
    survey: &'a Survey,
    plan: &'a InstallPlan,
}

#[derive(Serialize)]
struct InstallOutput<'a> {
    survey: &'a Survey,
    plan: &'a InstallPlan,
    result: &'a ExecutionReport,
}

pub fn run(ctx: &AppContext, args: &InstallArgs) -> Result<ExitCode> {
    // Installing works before any config exists; fall back to default paths.
    let config = ctx.config().unwrap_or_else(|err| {
        debug!(error = %err, "no usable config, using default install paths");
        SubstrateConfig::default()
    });

    let source = prepare(&args.source, &ctx.env.temp_dir)?;
    let found = survey(
        &ctx.env,
        &source.name,
        &config.state_dir(&ctx.env),
        &ctx.config_path,
    );

    if args.survey {
        if ctx.robot_mode {
            emit_machine(&found, ctx.output_format)?;
        } else {
            emit_human(render_survey(&found));
        }
        return Ok(ExitCode::SUCCESS);
    }

    let plan = build_plan(&found, &source.name, &source.dir, &config.install_dir(&ctx.env));

    if args.plan {
        if ctx.robot_mode {
            emit_machine(&PlanOutput { survey: &found, plan: &plan }, ctx.output_format)?;
        } else {
            let mut layout = render_survey(&found);
            layout.blank();
            render_plan(&mut layout, &plan);
            emit_human(layout);
        }
        return Ok(ExitCode::SUCCESS);
    }

    if found.needs_approval() && !args.yes && !args.dry_run {
        if ctx.robot_mode {
            return Err(SubstrateError::ApprovalRequired(format!(
                "installing '{}' replaces an existing skill",
                source.name
            )));
        }
        let mut layout = render_survey(&found);
        layout.blank();
        render_plan(&mut layout, &plan);
        emit_human(layout);
        if !confirm("Proceed? (yes/no): ")? {
            println!("Installation cancelled.");
            return Ok(ExitCode::FAILURE);
        }
    }

    let label = source.origin.display().to_string();
    let report = execute(&plan, &label, args.dry_run)?;

    if ctx.robot_mode {
        emit_machine(
            &InstallOutput {
                survey: &found,
                plan: &plan,
                result: &report,
            },
            ctx.output_format,
        )?;
    } else {
        emit_human(render_result(&plan, &report));
    }
    Ok(ExitCode::SUCCESS)
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("yes"))
}

fn render_survey(found: &Survey) -> HumanLayout {
    let mut layout = HumanLayout::new();
    layout
        .title(&format!("Survey of {}", found.workspace_root.display()))
        .kv("Skills", &found.existing_skills.len().to_string());
    if !found.existing_folders.is_empty() {
        let folders: Vec<&str> = found.existing_folders.keys().map(String::as_str).collect();
        layout.kv("Folders", &folders.join(", "));
    }
    for (convention, present) in &found.conventions {
        layout.kv(convention, if *present { "yes" } else { "no" });
    }

    if !found.conflicts.is_empty() {
        layout.blank().section("Conflicts");
        for conflict in &found.conflicts {
            match conflict.severity {
                Severity::Warning => layout.warn(&conflict.message),
                Severity::Info => layout.bullet(&conflict.message),
            };
            layout.push_line(format!("    Resolution: {}", conflict.resolution));
        }
    }
    if !found.recommendations.is_empty() {
        layout.blank().section("Recommendations");
        for rec in &found.recommendations {
            layout.bullet(&format!("{}: {}", rec.setting, rec.reason));
            layout.push_line(format!("    {}", rec.action));
        }
    }
    layout
}

fn render_plan(layout: &mut HumanLayout, plan: &InstallPlan) {
    layout.section("Installation plan");
    for (index, step) in plan.steps.iter().enumerate() {
        layout.push_line(format!("{}. {}", index + 1, step.description()));
        layout.push_line(format!("   Action: {}", step.action()));
    }
}

fn render_result(plan: &InstallPlan, report: &ExecutionReport) -> HumanLayout {
    let mut layout = HumanLayout::new();
    if report.dry_run {
        layout.push_line("[DRY RUN] Would run:");
        for step in &plan.steps {
            layout.bullet(&step.description());
        }
        return layout;
    }
    for step in &report.steps_completed {
        layout.ok(&step.description());
    }
    for created in &report.created_configs {
        layout.kv("Config", &created.display().to_string());
    }
    if let Some(record) = &report.record_path {
        layout.kv("Record", &record.display().to_string());
    }
    layout.ok(&format!("Installed {}", report.skill));
    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::PlanStep;

    #[test]
    fn plan_lists_numbered_steps() {
        console::set_colors_enabled(false);
        let plan = InstallPlan {
            skill: "alpha".into(),
            dest: PathBuf::from("/w/Skills/alpha"),
            steps: vec![
                PlanStep::Install {
                    source: PathBuf::from("/tmp/alpha"),
                    dest: PathBuf::from("/w/Skills/alpha"),
                },
                PlanStep::Manual {
                    description: "Configure: GITHUB_TOKEN".into(),
                },
            ],
        };
        let mut layout = HumanLayout::new();
        render_plan(&mut layout, &plan);
        let text = layout.build();
        assert!(text.contains("1. Install to /w/Skills/alpha"));
        assert!(text.contains("2. Configure: GITHUB_TOKEN"));
        assert!(text.contains("   Action: manual"));
    }

    #[test]
    fn dry_run_result_lists_plan() {
        console::set_colors_enabled(false);
        let plan = InstallPlan {
            skill: "alpha".into(),
            dest: PathBuf::from("/w/Skills/alpha"),
            steps: vec![PlanStep::Install {
                source: PathBuf::from("/tmp/alpha"),
                dest: PathBuf::from("/w/Skills/alpha"),
            }],
        };
        let report = ExecutionReport {
            skill: "alpha".into(),
            dry_run: true,
            steps_completed: Vec::new(),
            created_configs: Vec::new(),
            record_path: None,
        };
        let text = render_result(&plan, &report).build();
        assert!(text.starts_with("[DRY RUN] Would run:"));
    }
}
