//! substrate setup - Prerequisite check and initial configuration

use std::process::ExitCode;

use clap::{Args, Subcommand};

use super::exit_code;
use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_machine};
use crate::config::CloneMethod;
use crate::error::Result;
use crate::setup::{
    GithubAuth, InitOutcome, InitRequest, PrerequisiteReport, RepoOutcome, check_prerequisites,
    init,
};

#[derive(Args, Debug)]
pub struct SetupArgs {
    #[command(subcommand)]
    pub command: SetupCommand,
}

#[derive(Subcommand, Debug)]
pub enum SetupCommand {
    /// Check for git, gh and GitHub credentials
    Check,
    /// Write substrate.yaml and optionally create the relay repository
    Init(InitArgs),
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// This workspace's identity name
    #[arg(long)]
    pub identity: String,

    /// The partner workspace's identity name
    #[arg(long)]
    pub partner: String,

    /// Relay repository as owner/name
    #[arg(long)]
    pub repo: String,

    #[arg(long, default_value = "")]
    pub identity_handle: String,

    #[arg(long, default_value = "")]
    pub partner_handle: String,

    /// How the relay is cloned
    #[arg(long, value_enum, default_value_t = CloneMethod::Https)]
    pub clone_method: CloneMethod,

    /// Skills to export (comma-separated); empty means auto-detect
    #[arg(long, value_delimiter = ',')]
    pub skills: Vec<String>,

    /// Create and seed the relay repository with gh
    #[arg(long)]
    pub create_repo: bool,

    /// Make a created repository public
    #[arg(long, requires = "create_repo")]
    pub public: bool,

    /// Show the config without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

impl InitArgs {
    fn request(&self) -> InitRequest {
        InitRequest {
            identity: self.identity.clone(),
            partner: self.partner.clone(),
            repo: self.repo.clone(),
            identity_handle: self.identity_handle.clone(),
            partner_handle: self.partner_handle.clone(),
            clone_method: self.clone_method,
            skills: super::skill_filter(&self.skills).unwrap_or_default(),
            create_repo: self.create_repo,
            public: self.public,
            dry_run: self.dry_run,
        }
    }
}

pub fn run(ctx: &AppContext, args: &SetupArgs) -> Result<ExitCode> {
    match &args.command {
        SetupCommand::Check => {
            let report = check_prerequisites(&ctx.env);
            if ctx.robot_mode {
                emit_machine(&report, ctx.output_format)?;
            } else {
                emit_human(render_check(&report));
            }
            Ok(exit_code(report.passed()))
        }
        SetupCommand::Init(init_args) => {
            let outcome = init(&ctx.env, &ctx.config_path, &init_args.request())?;
            let success = !matches!(outcome.repo, Some(RepoOutcome::Failed(_)));
            if ctx.robot_mode {
                emit_machine(&outcome, ctx.output_format)?;
            } else {
                emit_human(render_init(&outcome)?);
            }
            Ok(exit_code(success))
        }
    }
}

fn render_check(report: &PrerequisiteReport) -> HumanLayout {
    let mut layout = HumanLayout::new();
    layout.title("Prerequisites");
    for tool in &report.tools {
        if tool.present {
            layout.ok(&format!(
                "{}: {}",
                tool.name,
                tool.version.as_deref().unwrap_or("installed")
            ));
        } else {
            layout.fail(&format!("{}: not found", tool.name));
        }
    }
    match report.github_auth {
        GithubAuth::Token => layout.ok("GitHub auth: GITHUB_TOKEN"),
        GithubAuth::GhCli => layout.ok("GitHub auth: gh CLI"),
        GithubAuth::Missing => layout.fail("GitHub auth: missing"),
    };

    if !report.passed() {
        layout.blank().section("Issues");
        for issue in &report.issues {
            layout.bullet(issue);
        }
    }
    layout
}

fn render_init(outcome: &InitOutcome) -> Result<HumanLayout> {
    let mut layout = HumanLayout::new();
    for warning in &outcome.warnings {
        layout.warn(warning);
    }

    match &outcome.repo {
        Some(RepoOutcome::Created) => {
            layout.ok(&format!("Created relay {}", outcome.config.substrate.repo));
        }
        Some(RepoOutcome::AlreadyExists) => {
            layout.ok(&format!("Relay {} already exists", outcome.config.substrate.repo));
        }
        Some(RepoOutcome::WouldCreate) => {
            layout.push_line(format!(
                "[DRY RUN] Would create relay {}",
                outcome.config.substrate.repo
            ));
        }
        Some(RepoOutcome::Failed(detail)) => {
            layout.fail(&format!("Relay creation failed: {detail}"));
        }
        None => {}
    }

    if outcome.dry_run {
        layout
            .push_line(format!(
                "[DRY RUN] Would write {}:",
                outcome.config_path.display()
            ))
            .blank()
            .push_line(serde_yaml::to_string(&outcome.config)?);
    } else {
        if let Some(backup) = &outcome.backup {
            layout.kv("Backup", &backup.display().to_string());
        }
        layout.ok(&format!("Config written: {}", outcome.config_path.display()));
        layout.push_line("Next: substrate setup check, then substrate push --dry-run");
    }
    Ok(layout)
}
