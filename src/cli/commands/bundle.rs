//! substrate bundle - Create, validate and list skill bundles

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Subcommand};

use super::exit_code;
use crate::app::AppContext;
use crate::bundler::{
    BundleOutcome, BundleRequest, DEFAULT_VERSION, ValidationReport, create_bundle,
    validate_bundle, verify_checksums,
};
use crate::cli::OutputFormat;
use crate::cli::output::{HumanLayout, emit_human, emit_machine, emit_tsv};
use crate::error::Result;
use crate::skills::{self, Skill};
use crate::utils::git::workspace_revision;

const BUNDLE_DIR_NAME: &str = "zo-substrate-bundles";

#[derive(Args, Debug)]
pub struct BundleArgs {
    #[command(subcommand)]
    pub command: BundleCommand,
}

#[derive(Subcommand, Debug)]
pub enum BundleCommand {
    /// Package a skill into a .tar.gz bundle
    Create(BundleCreateArgs),
    /// Check a bundle's structure and paths
    Validate(BundleValidateArgs),
    /// List discoverable skills
    List,
}

#[derive(Args, Debug)]
pub struct BundleCreateArgs {
    /// Skill directory name under Skills/
    pub skill: String,

    /// Bundle version
    #[arg(long, default_value = DEFAULT_VERSION)]
    pub version: String,

    /// Free-form release notes stored in metadata.json
    #[arg(long, default_value = "")]
    pub notes: String,

    /// Output directory (default: <temp>/zo-substrate-bundles)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Compute metadata without writing the archive
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct BundleValidateArgs {
    /// Path to the bundle .tar.gz
    pub path: PathBuf,

    /// Also verify each file against its stored checksum
    #[arg(long)]
    pub verify: bool,
}

pub fn run(ctx: &AppContext, args: &BundleArgs) -> Result<ExitCode> {
    match &args.command {
        BundleCommand::Create(create) => run_create(ctx, create),
        BundleCommand::Validate(validate) => run_validate(ctx, validate),
        BundleCommand::List => run_list(ctx),
    }
}

fn run_create(ctx: &AppContext, args: &BundleCreateArgs) -> Result<ExitCode> {
    let config = ctx.config()?;
    let request = BundleRequest {
        identity: config.identity.name.clone(),
        version: args.version.clone(),
        notes: args.notes.clone(),
        output_dir: args
            .output
            .clone()
            .unwrap_or_else(|| ctx.env.temp_dir.join(BUNDLE_DIR_NAME)),
        git_sha: workspace_revision(&ctx.env.workspace_root),
        dry_run: args.dry_run,
    };
    let outcome = create_bundle(&ctx.env.skills_dir().join(&args.skill), &request)?;

    if ctx.robot_mode {
        emit_machine(&outcome, ctx.output_format)?;
    } else {
        emit_human(render_created(&outcome));
    }
    Ok(ExitCode::SUCCESS)
}

fn render_created(outcome: &BundleOutcome) -> HumanLayout {
    let mut layout = HumanLayout::new();
    match (&outcome.path, outcome.dry_run) {
        (Some(path), false) => {
            layout.ok(&format!(
                "Created: {} ({} bytes, {} files)",
                path.display(),
                outcome.size_bytes.unwrap_or_default(),
                outcome.files
            ));
            if let Some(checksum) = &outcome.checksum {
                layout.kv("Checksum", checksum);
            }
        }
        _ => {
            layout.push_line(format!(
                "[DRY RUN] Would bundle: {} ({} files)",
                outcome.skill, outcome.files
            ));
            for (name, digest) in &outcome.metadata.checksums {
                layout.bullet(&format!("{name}  {digest}"));
            }
        }
    }
    layout
}

fn run_validate(ctx: &AppContext, args: &BundleValidateArgs) -> Result<ExitCode> {
    let report = if args.verify {
        verify_checksums(&args.path)
    } else {
        validate_bundle(&args.path)
    };

    if ctx.robot_mode {
        emit_machine(&report, ctx.output_format)?;
    } else {
        emit_human(render_validation(&report));
    }
    Ok(exit_code(report.valid))
}

fn render_validation(report: &ValidationReport) -> HumanLayout {
    let mut layout = HumanLayout::new();
    if report.valid {
        layout.ok("Valid: true");
    } else {
        layout.fail("Valid: false");
    }
    if let Some(name) = &report.skill_name {
        layout.kv("Skill", name);
    }
    for error in &report.errors {
        layout.push_line(format!("  ERROR: {error}"));
    }
    for warning in &report.warnings {
        layout.push_line(format!("  WARN: {warning}"));
    }
    layout
}

fn run_list(ctx: &AppContext) -> Result<ExitCode> {
    let config = ctx.config()?;
    let found = skills::discover(&ctx.env, &config.export)?;

    match ctx.output_format {
        OutputFormat::Tsv => emit_tsv(&["name", "scripts", "path"], &found, |skill| {
            vec![
                skill.name.clone(),
                skill.has_scripts.to_string(),
                skill.path.display().to_string(),
            ]
        }),
        format if format.is_machine_readable() => emit_machine(&found, format)?,
        _ => emit_human(render_list(&found)),
    }
    Ok(ExitCode::SUCCESS)
}

fn render_list(found: &[Skill]) -> HumanLayout {
    let mut layout = HumanLayout::new();
    layout.push_line(format!("{:<30} {:<10} {}", "Skill", "Scripts", "Path"));
    layout.push_line("-".repeat(70));
    for skill in found {
        layout.push_line(format!(
            "{:<30} {:<10} {}",
            skill.name,
            if skill.has_scripts { "yes" } else { "no" },
            skill.path.display()
        ));
    }
    layout
}
