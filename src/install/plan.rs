//! Ordered installation steps and their execution.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use super::survey::Survey;
use crate::error::Result;
use crate::sync::pull::backup_path;
use crate::utils::fs::{copy_tree_filtered, move_dir, remove_dir_if_exists};

pub const INSTALL_RECORD_FILE: &str = ".installation_record.json";

const TEMPLATE_SUFFIX: &str = ".example";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlanStep {
    Backup { source: PathBuf, dest: PathBuf },
    Install { source: PathBuf, dest: PathBuf },
    /// Templates relative to the installed skill, e.g. `config/x.yaml.example`.
    CreateConfig { templates: Vec<PathBuf> },
    Manual { description: String },
}

impl PlanStep {
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Backup { dest, .. } => format!("Backup existing skill to {}", dest.display()),
            Self::Install { dest, .. } => format!("Install to {}", dest.display()),
            Self::CreateConfig { templates } => {
                format!("Create {} config file(s) from templates", templates.len())
            }
            Self::Manual { description } => description.clone(),
        }
    }

    #[must_use]
    pub const fn action(&self) -> &'static str {
        match self {
            Self::Backup { .. } => "backup",
            Self::Install { .. } => "install",
            Self::CreateConfig { .. } => "create_config",
            Self::Manual { .. } => "manual",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InstallPlan {
    pub skill: String,
    pub dest: PathBuf,
    pub steps: Vec<PlanStep>,
}

/// `*.example` files under `<skill>/config`, relative to the skill, sorted.
fn config_templates(skill_dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(skill_dir.join("config")) else {
        return Vec::new();
    };
    let mut templates: Vec<PathBuf> = entries
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.path().is_file())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.ends_with(TEMPLATE_SUFFIX))
        })
        .map(|entry| Path::new("config").join(entry.file_name()))
        .collect();
    templates.sort();
    templates
}

/// Steps installing `source` as `<install_dir>/<skill>`.
#[must_use]
pub fn build_plan(survey: &Survey, skill: &str, source: &Path, install_dir: &Path) -> InstallPlan {
    let dest = install_dir.join(skill);
    let mut steps = Vec::new();

    if dest.exists() {
        steps.push(PlanStep::Backup {
            source: dest.clone(),
            dest: backup_path(install_dir, skill),
        });
    }
    steps.push(PlanStep::Install {
        source: source.to_path_buf(),
        dest: dest.clone(),
    });

    let templates = config_templates(source);
    if !templates.is_empty() {
        steps.push(PlanStep::CreateConfig { templates });
    }

    if !survey.recommendations.is_empty() {
        let settings: Vec<&str> = survey
            .recommendations
            .iter()
            .map(|rec| rec.setting.as_str())
            .collect();
        steps.push(PlanStep::Manual {
            description: format!("Configure: {}", settings.join(", ")),
        });
    }

    InstallPlan {
        skill: skill.to_string(),
        dest,
        steps,
    }
}

/// `.installation_record.json` inside an installed skill.
#[derive(Debug, Clone, Serialize)]
pub struct InstallRecord {
    pub installed_at: String,
    pub source: String,
    pub steps_completed: Vec<PlanStep>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub skill: String,
    pub dry_run: bool,
    pub steps_completed: Vec<PlanStep>,
    pub created_configs: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_path: Option<PathBuf>,
}

/// Run `plan`, or only list it on a dry run.
pub fn execute(plan: &InstallPlan, source_label: &str, dry_run: bool) -> Result<ExecutionReport> {
    let mut report = ExecutionReport {
        skill: plan.skill.clone(),
        dry_run,
        steps_completed: Vec::new(),
        created_configs: Vec::new(),
        record_path: None,
    };
    if dry_run {
        return Ok(report);
    }

    for step in &plan.steps {
        match step {
            PlanStep::Backup { source, dest } => {
                move_dir(source, dest)?;
                info!(backup = %dest.display(), "backed up existing skill");
            }
            PlanStep::Install { source, dest } => {
                remove_dir_if_exists(dest)?;
                let files = copy_tree_filtered(source, dest)?;
                info!(dest = %dest.display(), files, "installed skill");
            }
            PlanStep::CreateConfig { templates } => {
                for template in templates {
                    let template_path = plan.dest.join(template);
                    let Some(name) = template_path
                        .file_name()
                        .and_then(|name| name.to_str())
                        .and_then(|name| name.strip_suffix(TEMPLATE_SUFFIX))
                    else {
                        continue;
                    };
                    let target = template_path.with_file_name(name);
                    if template_path.is_file() && !target.exists() {
                        std::fs::copy(&template_path, &target)?;
                        report.created_configs.push(target);
                    }
                }
            }
            PlanStep::Manual { description } => {
                info!("manual step required: {description}");
            }
        }
        report.steps_completed.push(step.clone());
    }

    let record = InstallRecord {
        installed_at: Utc::now().to_rfc3339(),
        source: source_label.to_string(),
        steps_completed: report.steps_completed.clone(),
    };
    let record_path = plan.dest.join(INSTALL_RECORD_FILE);
    std::fs::write(&record_path, serde_json::to_string_pretty(&record)?)?;
    report.record_path = Some(record_path);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::survey::survey;
    use crate::test_utils::WorkspaceFixture;

    fn source_skill(fixture: &WorkspaceFixture) -> PathBuf {
        let src = fixture.temp_dir.path().join("incoming/alpha");
        std::fs::create_dir_all(src.join("config")).unwrap();
        std::fs::write(src.join("SKILL.md"), "new").unwrap();
        std::fs::write(src.join("config/settings.yaml.example"), "a: 1").unwrap();
        std::fs::write(src.join("config/keep.yaml"), "b: 2").unwrap();
        src
    }

    #[test]
    fn plan_orders_backup_install_config_manual() {
        let fixture = WorkspaceFixture::new();
        fixture.create_skill("alpha");
        let src = source_skill(&fixture);
        let env = fixture.env();
        let found = survey(&env, "alpha", &fixture.root.join("data"), &env.default_config_path());

        let plan = build_plan(&found, "alpha", &src, &env.skills_dir());
        let actions: Vec<&str> = plan.steps.iter().map(PlanStep::action).collect();
        assert_eq!(actions, vec!["backup", "install", "create_config", "manual"]);
        assert_eq!(
            plan.steps[2],
            PlanStep::CreateConfig {
                templates: vec![PathBuf::from("config/settings.yaml.example")]
            }
        );
    }

    #[test]
    fn execute_installs_and_records() {
        let fixture = WorkspaceFixture::new();
        fixture.create_file("Skills/alpha/SKILL.md", "old");
        let src = source_skill(&fixture);
        let env = fixture.env();
        let found = survey(&env, "alpha", &fixture.root.join("data"), &env.default_config_path());
        let plan = build_plan(&found, "alpha", &src, &env.skills_dir());

        let report = execute(&plan, "incoming/alpha", false).unwrap();
        let dest = env.skills_dir().join("alpha");
        assert_eq!(std::fs::read_to_string(dest.join("SKILL.md")).unwrap(), "new");
        assert_eq!(
            std::fs::read_to_string(dest.join("config/settings.yaml")).unwrap(),
            "a: 1"
        );
        assert_eq!(report.created_configs, vec![dest.join("config/settings.yaml")]);

        let PlanStep::Backup { dest: backup, .. } = &plan.steps[0] else {
            panic!("expected backup step first");
        };
        assert_eq!(std::fs::read_to_string(backup.join("SKILL.md")).unwrap(), "old");

        let record: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dest.join(INSTALL_RECORD_FILE)).unwrap(),
        )
        .unwrap();
        assert_eq!(record["source"], "incoming/alpha");
        assert_eq!(record["steps_completed"][1]["action"], "install");
    }

    #[test]
    fn dry_run_changes_nothing() {
        let fixture = WorkspaceFixture::new();
        let src = source_skill(&fixture);
        let env = fixture.env();
        let found = survey(&env, "alpha", &fixture.root.join("data"), &env.default_config_path());
        let plan = build_plan(&found, "alpha", &src, &env.skills_dir());

        let report = execute(&plan, "x", true).unwrap();
        assert!(report.dry_run);
        assert!(report.steps_completed.is_empty());
        assert!(!env.skills_dir().join("alpha").exists());
    }
}
