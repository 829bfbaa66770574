//! Read-only look at the target workspace before anything is installed.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::Environment;
use crate::skills;

/// Folders whose presence is reported to the user.
const KEY_FOLDERS: &[&str] = &[
    "Personal",
    "Documents",
    "Projects",
    "Datasets",
    "Records",
    "Knowledge",
];

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    SkillExists,
    PathExists,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Conflict {
    #[serde(rename = "type")]
    pub kind: ConflictKind,
    pub message: String,
    pub severity: Severity,
    pub resolution: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Recommendation {
    pub setting: String,
    pub reason: String,
    pub action: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Survey {
    pub workspace_root: PathBuf,
    pub existing_skills: Vec<String>,
    pub existing_folders: BTreeMap<String, bool>,
    pub conventions: BTreeMap<String, bool>,
    pub conflicts: Vec<Conflict>,
    pub recommendations: Vec<Recommendation>,
}

impl Survey {
    /// Conflicts that change existing files and need approval.
    #[must_use]
    pub fn needs_approval(&self) -> bool {
        self.conflicts
            .iter()
            .any(|conflict| conflict.severity == Severity::Warning)
    }
}

/// Survey `env` for installing `skill`.
///
/// `state_dir` and `config_path` are checked for prior installs.
#[must_use]
pub fn survey(env: &Environment, skill: &str, state_dir: &Path, config_path: &Path) -> Survey {
    let existing_skills: Vec<String> = skills::scan_all(env)
        .map(|found| found.into_iter().map(|s| s.name).collect())
        .unwrap_or_default();

    let root = &env.workspace_root;
    let mut existing_folders = BTreeMap::new();
    for folder in KEY_FOLDERS {
        if root.join(folder).is_dir() {
            existing_folders.insert((*folder).to_string(), true);
        }
    }
    if root.join("Personal/Meetings").is_dir() {
        existing_folders.insert("Personal/Meetings".to_string(), true);
    }

    let mut conventions = BTreeMap::new();
    conventions.insert("has_agents_md".to_string(), root.join("AGENTS.md").is_file());
    conventions.insert("has_state_dir".to_string(), state_dir.is_dir());

    let mut conflicts = Vec::new();
    if existing_skills.iter().any(|name| name == skill) {
        conflicts.push(Conflict {
            kind: ConflictKind::SkillExists,
            message: format!("Skill '{skill}' already exists"),
            severity: Severity::Warning,
            resolution: "Will backup existing and install new version".to_string(),
        });
    }
    if state_dir.exists() {
        conflicts.push(Conflict {
            kind: ConflictKind::PathExists,
            message: format!("Path '{}' already exists", state_dir.display()),
            severity: Severity::Info,
            resolution: "Will use existing path".to_string(),
        });
    }

    let mut recommendations = Vec::new();
    if env.github_token.is_none() {
        recommendations.push(Recommendation {
            setting: "GITHUB_TOKEN".to_string(),
            reason: "Needed to clone and push the relay over https".to_string(),
            action: "Export GITHUB_TOKEN or authenticate gh".to_string(),
        });
    }
    if !config_path.exists() {
        recommendations.push(Recommendation {
            setting: "substrate.yaml".to_string(),
            reason: "Push and pull need identities and a relay repository".to_string(),
            action: "Run: substrate setup init --identity <me> --partner <them> --repo <owner/name>"
                .to_string(),
        });
    }

    Survey {
        workspace_root: root.clone(),
        existing_skills,
        existing_folders,
        conventions,
        conflicts,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::WorkspaceFixture;

    #[test]
    fn fresh_workspace_has_no_conflicts() {
        let fixture = WorkspaceFixture::new();
        fixture.create_file("Documents/a.md", "");
        let env = fixture.env();
        let result = survey(
            &env,
            "alpha",
            &fixture.root.join("data/zo-substrate"),
            &env.default_config_path(),
        );
        assert!(result.conflicts.is_empty());
        assert!(!result.needs_approval());
        assert_eq!(result.existing_folders.get("Documents"), Some(&true));
        assert!(!result.existing_folders.contains_key("Projects"));
        assert!(!result.conventions["has_agents_md"]);
        assert!(
            result
                .recommendations
                .iter()
                .any(|rec| rec.setting == "substrate.yaml")
        );
    }

    #[test]
    fn existing_skill_needs_approval() {
        let fixture = WorkspaceFixture::new();
        fixture.create_skill("alpha");
        fixture.create_file("AGENTS.md", "");
        std::fs::create_dir_all(fixture.root.join("data/zo-substrate")).unwrap();
        let env = fixture.env().with_token(Some("t".into()));
        let result = survey(
            &env,
            "alpha",
            &fixture.root.join("data/zo-substrate"),
            &env.default_config_path(),
        );
        assert!(result.needs_approval());
        assert_eq!(result.conflicts.len(), 2);
        assert_eq!(result.conflicts[0].kind, ConflictKind::SkillExists);
        assert_eq!(result.conflicts[1].severity, Severity::Info);
        assert!(result.conventions["has_agents_md"]);
        assert!(
            result
                .recommendations
                .iter()
                .all(|rec| rec.setting != "GITHUB_TOKEN")
        );
    }
}
