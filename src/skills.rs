//! Skill discovery.
//!
//! A skill is a directory under `<workspace>/Skills` carrying a `SKILL.md`
//! descriptor. Discovery never mutates what it finds.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::config::{Environment, ExportConfig};
use crate::error::Result;
use crate::utils::fs::dir_has_entries;

pub const DESCRIPTOR_FILE: &str = "SKILL.md";

/// A discovered skill.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Skill {
    pub name: String,
    /// Path relative to the workspace root.
    pub path: PathBuf,
    pub abs_path: PathBuf,
    pub has_scripts: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frontmatter_name: Option<String>,
}

impl Skill {
    /// Build a record for `dir` if it is a skill directory.
    #[must_use]
    pub fn from_dir(dir: &Path, workspace_root: &Path) -> Option<Self> {
        if !dir.is_dir() {
            return None;
        }
        let name = dir.file_name()?.to_str()?.to_string();
        let descriptor = dir.join(DESCRIPTOR_FILE);
        if !descriptor.is_file() {
            return None;
        }
        let frontmatter_name = std::fs::read_to_string(&descriptor)
            .ok()
            .and_then(|content| frontmatter_name(&content))
            .filter(|declared| declared != &name);
        Some(Self {
            path: dir
                .strip_prefix(workspace_root)
                .unwrap_or(dir)
                .to_path_buf(),
            abs_path: dir.to_path_buf(),
            has_scripts: dir_has_entries(&dir.join("scripts")),
            frontmatter_name,
            name,
        })
    }
}

/// First `name:` line of a descriptor, quotes stripped.
#[must_use]
pub fn frontmatter_name(content: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("name:"))
        .and_then(|line| line.split_once(':'))
        .map(|(_, value)| value.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
        .filter(|value| !value.is_empty())
}

/// Every skill directory under `<workspace>/Skills`, sorted by name.
pub fn scan_all(env: &Environment) -> Result<Vec<Skill>> {
    let skills_dir = env.skills_dir();
    if !skills_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut skills = Vec::new();
    for entry in std::fs::read_dir(&skills_dir)? {
        let path = entry?.path();
        if let Some(skill) = Skill::from_dir(&path, &env.workspace_root) {
            skills.push(skill);
        }
    }
    skills.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(skills)
}

/// Skills eligible for export under the configured policy.
///
/// An explicit list bypasses auto detection; with neither, nothing is
/// exported. Excluded names and directories lacking `SKILL.md` are dropped.
pub fn discover(env: &Environment, export: &ExportConfig) -> Result<Vec<Skill>> {
    let skills_dir = env.skills_dir();
    if !skills_dir.is_dir() {
        debug!(dir = %skills_dir.display(), "skills directory missing");
        return Ok(Vec::new());
    }

    let candidates: Vec<PathBuf> = if !export.skills.is_empty() {
        export.skills.iter().map(|name| skills_dir.join(name)).collect()
    } else if export.auto_detect {
        let mut dirs = Vec::new();
        for entry in std::fs::read_dir(&skills_dir)? {
            dirs.push(entry?.path());
        }
        dirs.sort();
        dirs
    } else {
        return Ok(Vec::new());
    };

    let skills = candidates
        .iter()
        .filter_map(|dir| Skill::from_dir(dir, &env.workspace_root))
        .filter(|skill| !export.exclude.iter().any(|ex| ex == &skill.name))
        .collect();
    Ok(skills)
}

/// Keep only skills named in `filter`; `None` keeps everything.
#[must_use]
pub fn apply_filter(skills: Vec<Skill>, filter: Option<&[String]>) -> Vec<Skill> {
    match filter {
        Some(names) if !names.is_empty() => skills
            .into_iter()
            .filter(|skill| names.iter().any(|n| n == &skill.name))
            .collect(),
        _ => skills,
    }
}
