//! Workspace awareness: sync status and the `context.json` snapshot.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{Environment, SubstrateConfig};
use crate::error::{Result, SubstrateError};
use crate::events::{Event, EventLog};
use crate::skills::{self, Skill};
use crate::sync::{PullState, PushState, StateRecord};

pub const CONTEXT_FILE: &str = "context.json";

/// Children listed per top-level folder.
const FOLDER_PREVIEW: usize = 10;

/// Events shown by `status`.
const RECENT_EVENTS: usize = 5;

/// Everything `substrate status` reports.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub identity: String,
    pub partner: String,
    pub repo: String,
    pub branch: String,
    pub last_push: PushState,
    pub last_pull: PullState,
    pub skills: Vec<String>,
    pub recent_events: Vec<Event>,
}

/// Gather identity, last-sync records and discoverable skills.
pub fn status(config: &SubstrateConfig, env: &Environment) -> Result<StatusReport> {
    let state_dir = config.state_dir(env);
    let skills = skills::discover(env, &config.export)?
        .into_iter()
        .map(|skill| skill.name)
        .collect();
    let recent_events = EventLog::new(&state_dir, &config.identity.name)
        .recent(RECENT_EVENTS)
        .unwrap_or_else(|err| {
            warn!(error = %err, "could not read event log");
            Vec::new()
        });
    Ok(StatusReport {
        identity: config.identity.name.clone(),
        partner: config.partner.name.clone(),
        repo: config.substrate.repo.clone(),
        branch: config.substrate.branch.clone(),
        last_push: PushState::load(&state_dir),
        last_pull: PullState::load(&state_dir),
        skills,
        recent_events,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkillDetail {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub scripts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontmatter_name: Option<String>,
}

/// Contents of `context.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContextSnapshot {
    pub last_refresh: String,
    pub identity: String,
    pub skills: Vec<String>,
    pub skills_detail: Vec<SkillDetail>,
    pub folder_structure: BTreeMap<String, Vec<String>>,
}

impl ContextSnapshot {
    #[must_use]
    pub fn path(config: &SubstrateConfig, env: &Environment) -> PathBuf {
        config.state_dir(env).join(CONTEXT_FILE)
    }

    /// Load the snapshot, `Ok(None)` when it was never refreshed.
    pub fn load(config: &SubstrateConfig, env: &Environment) -> Result<Option<Self>> {
        let path = Self::path(config, env);
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&path)?;
        let snapshot = serde_json::from_str(&raw).map_err(|err| {
            SubstrateError::Config(format!("parse {}: {err}", path.display()))
        })?;
        Ok(Some(snapshot))
    }
}

/// Rescan the workspace and overwrite `context.json`.
pub fn refresh(config: &SubstrateConfig, env: &Environment) -> Result<ContextSnapshot> {
    let skills = skills::scan_all(env)?;
    let snapshot = ContextSnapshot {
        last_refresh: Utc::now().to_rfc3339(),
        identity: config.identity.name.clone(),
        skills: skills.iter().map(|skill| skill.name.clone()).collect(),
        skills_detail: skills.iter().map(detail).collect(),
        folder_structure: folder_structure(&env.workspace_root),
    };

    let path = ContextSnapshot::path(config, env);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, serde_json::to_string_pretty(&snapshot)?)?;
    debug!(path = %path.display(), skills = snapshot.skills.len(), "context refreshed");
    Ok(snapshot)
}

fn detail(skill: &Skill) -> SkillDetail {
    SkillDetail {
        name: skill.name.clone(),
        path: skill.path.to_string_lossy().into_owned(),
        scripts: script_names(&skill.abs_path.join("scripts")),
        frontmatter_name: skill.frontmatter_name.clone(),
    }
}

fn script_names(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_file()))
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Visible top-level folders with their first children, dirs suffixed `/`.
#[must_use]
pub fn folder_structure(root: &Path) -> BTreeMap<String, Vec<String>> {
    let mut structure = BTreeMap::new();
    let Ok(entries) = std::fs::read_dir(root) else {
        return structure;
    };
    for entry in entries.filter_map(std::result::Result::ok) {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || !entry.path().is_dir() {
            continue;
        }
        // Unreadable folders are listed with no children.
        let mut children: Vec<(String, bool)> = std::fs::read_dir(entry.path())
            .map(|children| {
                children
                    .filter_map(std::result::Result::ok)
                    .map(|child| {
                        let is_dir = child.path().is_dir();
                        (child.file_name().to_string_lossy().into_owned(), is_dir)
                    })
                    .collect()
            })
            .unwrap_or_default();
        children.sort();
        let listed = children
            .into_iter()
            .take(FOLDER_PREVIEW)
            .map(|(child, is_dir)| if is_dir { format!("{child}/") } else { child })
            .collect();
        structure.insert(format!("{name}/"), listed);
    }
    structure
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::WorkspaceFixture;

    #[test]
    fn refresh_writes_snapshot() {
        let fixture = WorkspaceFixture::new();
        fixture.create_file(
            "Skills/alpha/SKILL.md",
            "---\nname: \"Alpha Skill\"\n---\n",
        );
        fixture.create_file("Skills/alpha/scripts/run.py", "print()");
        fixture.create_file("Skills/alpha/scripts/util.py", "");
        fixture.create_skill("beta");
        fixture.create_file("Skills/notes/README.md", "not a skill");
        let env = fixture.env();
        let config = fixture.config("va", Path::new("unused"));

        let snapshot = refresh(&config, &env).unwrap();
        assert_eq!(snapshot.identity, "va");
        assert_eq!(snapshot.skills, vec!["alpha", "beta"]);
        let alpha = &snapshot.skills_detail[0];
        assert_eq!(alpha.path, "Skills/alpha");
        assert_eq!(alpha.scripts, vec!["run.py", "util.py"]);
        assert_eq!(alpha.frontmatter_name.as_deref(), Some("Alpha Skill"));
        assert!(snapshot.skills_detail[1].frontmatter_name.is_none());

        let loaded = ContextSnapshot::load(&config, &env).unwrap().unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn load_without_refresh_is_none() {
        let fixture = WorkspaceFixture::new();
        let config = fixture.config("va", Path::new("unused"));
        assert!(ContextSnapshot::load(&config, &fixture.env()).unwrap().is_none());
    }

    #[test]
    fn folder_structure_previews_children() {
        let fixture = WorkspaceFixture::new();
        for i in 0..12 {
            fixture.create_file(&format!("Documents/file{i:02}.md"), "");
        }
        fixture.create_file("Documents/a-sub/x", "");
        fixture.create_file(".hidden/x", "");
        fixture.create_file("top.txt", "");

        let structure = folder_structure(&fixture.root);
        assert!(structure.contains_key("Skills/"));
        assert!(!structure.contains_key(".hidden/"));
        assert!(!structure.contains_key("top.txt"));
        let docs = &structure["Documents/"];
        assert_eq!(docs.len(), 10);
        assert_eq!(docs[0], "a-sub/");
        assert_eq!(docs[1], "file00.md");
    }

    #[test]
    fn status_reports_never_synced() {
        let fixture = WorkspaceFixture::new();
        fixture.create_skill("alpha");
        fixture.create_skill("zo-substrate");
        let config = fixture.config("va", Path::new("unused"));

        let report = status(&config, &fixture.env()).unwrap();
        assert_eq!(report.identity, "va");
        assert_eq!(report.partner, "partner");
        assert_eq!(report.skills, vec!["alpha"]);
        assert!(report.last_push.last_push.is_none());
        assert!(report.last_pull.last_pull.is_none());
        assert!(report.recent_events.is_empty());
    }
}
