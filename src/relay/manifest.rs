//! `MANIFEST.json` at the relay root: what an identity last exported.

use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::bundler::SCHEMA_VERSION;
use crate::error::{Result, SubstrateError};

pub const MANIFEST_FILE: &str = "MANIFEST.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelayManifest {
    #[serde(default)]
    pub generated_at: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub source_handle: String,
    #[serde(default)]
    pub git_sha: String,
    #[serde(default)]
    pub exported_skills: Vec<String>,
    #[serde(default)]
    pub skill_count: usize,
    #[serde(default)]
    pub schema_version: String,
}

impl RelayManifest {
    /// Manifest for a push of `skills`; names are sorted.
    #[must_use]
    pub fn new(source: &str, source_handle: &str, git_sha: &str, skills: &[String]) -> Self {
        let mut exported_skills = skills.to_vec();
        exported_skills.sort();
        Self {
            generated_at: Utc::now().to_rfc3339(),
            source: source.to_string(),
            source_handle: source_handle.to_string(),
            git_sha: git_sha.to_string(),
            skill_count: exported_skills.len(),
            exported_skills,
            schema_version: SCHEMA_VERSION.to_string(),
        }
    }

    /// Placeholder written when a relay is first seeded.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            generated_at: String::new(),
            source: String::new(),
            source_handle: String::new(),
            git_sha: String::new(),
            exported_skills: Vec::new(),
            skill_count: 0,
            schema_version: SCHEMA_VERSION.to_string(),
        }
    }

    /// Read the manifest under `root`. `Ok(None)` when absent.
    pub fn read(root: &Path) -> Result<Option<Self>> {
        let path = root.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&path)?;
        let manifest = serde_json::from_str(&raw).map_err(|err| {
            SubstrateError::Config(format!("parse {}: {err}", path.display()))
        })?;
        Ok(Some(manifest))
    }

    /// Overwrite the manifest under `root`.
    pub fn write(&self, root: &Path) -> Result<()> {
        let payload = serde_json::to_string_pretty(self)?;
        std::fs::write(root.join(MANIFEST_FILE), payload)?;
        Ok(())
    }
}
