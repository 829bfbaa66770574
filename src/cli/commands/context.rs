//! substrate context - Refresh or query the workspace snapshot

use std::process::ExitCode;

use clap::{Args, Subcommand, ValueEnum};

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, emit_machine};
use crate::context::{ContextSnapshot, refresh};
use crate::error::Result;

const STRUCTURE_PREVIEW: usize = 5;

const REFRESH_HINT: &str = "No context snapshot found. Run: substrate context refresh";

#[derive(Args, Debug)]
pub struct ContextArgs {
    #[command(subcommand)]
    pub command: ContextCommand,
}

#[derive(Subcommand, Debug)]
pub enum ContextCommand {
    /// Rescan skills and folder structure into context.json
    Refresh,
    /// Print part of the last snapshot
    Query(QueryArgs),
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Which part of the snapshot to print
    #[arg(long, value_enum, default_value_t = QueryTarget::Summary)]
    pub what: QueryTarget,

    /// Include paths and scripts for each skill
    #[arg(long)]
    pub detail: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QueryTarget {
    Summary,
    Skills,
    Structure,
    Json,
}

pub fn run(ctx: &AppContext, args: &ContextArgs) -> Result<ExitCode> {
    let config = ctx.config()?;
    match &args.command {
        ContextCommand::Refresh => {
            let snapshot = refresh(&config, &ctx.env)?;
            if ctx.robot_mode {
                emit_machine(&snapshot, ctx.output_format)?;
            } else {
                let mut layout = HumanLayout::new();
                layout.ok(&format!(
                    "Context refreshed: {} skills found",
                    snapshot.skills.len()
                ));
                emit_human(layout);
            }
        }
        ContextCommand::Query(query) => {
            let Some(snapshot) = ContextSnapshot::load(&config, &ctx.env)? else {
                if ctx.robot_mode {
                    let payload = serde_json::json!({ "snapshot": null, "hint": REFRESH_HINT });
                    emit_machine(&payload, ctx.output_format)?;
                } else {
                    println!("{REFRESH_HINT}");
                }
                return Ok(ExitCode::SUCCESS);
            };
            if ctx.robot_mode {
                emit_machine(&snapshot, ctx.output_format)?;
            } else if query.what == QueryTarget::Json {
                emit_json(&snapshot)?;
            } else {
                emit_human(render(&snapshot, query.what, query.detail));
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn render(snapshot: &ContextSnapshot, what: QueryTarget, detail: bool) -> HumanLayout {
    let mut layout = HumanLayout::new();
    match what {
        QueryTarget::Summary | QueryTarget::Json => {
            layout
                .kv("Identity", &snapshot.identity)
                .kv("Last refresh", &snapshot.last_refresh)
                .kv("Skills", &snapshot.skills.len().to_string());
            for name in &snapshot.skills {
                layout.bullet(name);
            }
        }
        QueryTarget::Skills if detail => {
            for skill in &snapshot.skills_detail {
                layout.push_line(format!("- {} ({})", skill.name, skill.path));
                if !skill.scripts.is_empty() {
                    layout.push_line(format!("  Scripts: {}", skill.scripts.join(", ")));
                }
            }
        }
        QueryTarget::Skills => {
            for name in &snapshot.skills {
                layout.push_line(format!("- {name}"));
            }
        }
        QueryTarget::Structure => {
            for (folder, children) in &snapshot.folder_structure {
                layout.push_line(format!("- {folder}"));
                for child in children.iter().take(STRUCTURE_PREVIEW) {
                    layout.bullet(child);
                }
            }
        }
    }
    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SkillDetail;
    use std::collections::BTreeMap;

    fn snapshot() -> ContextSnapshot {
        let mut folder_structure = BTreeMap::new();
        folder_structure.insert(
            "Documents/".to_string(),
            (0..8).map(|i| format!("doc{i}.md")).collect(),
        );
        ContextSnapshot {
            last_refresh: "2024-05-01T00:00:00Z".into(),
            identity: "va".into(),
            skills: vec!["alpha".into()],
            skills_detail: vec![SkillDetail {
                name: "alpha".into(),
                path: "Skills/alpha".into(),
                scripts: vec!["run.py".into()],
                frontmatter_name: None,
            }],
            folder_structure,
        }
    }

    #[test]
    fn skills_detail_lists_scripts() {
        console::set_colors_enabled(false);
        let text = render(&snapshot(), QueryTarget::Skills, true).build();
        assert!(text.contains("- alpha (Skills/alpha)"));
        assert!(text.contains("Scripts: run.py"));

        let plain = render(&snapshot(), QueryTarget::Skills, false).build();
        assert_eq!(plain, "- alpha");
    }

    #[test]
    fn structure_preview_is_capped() {
        console::set_colors_enabled(false);
        let text = render(&snapshot(), QueryTarget::Structure, false).build();
        assert!(text.contains("doc4.md"));
        assert!(!text.contains("doc5.md"));
    }
}
