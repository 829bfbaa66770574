//! Survey, plan, approve, execute: installing one skill into a workspace.
//!
//! The source is either a skill directory or a bundle archive. Bundles are
//! verified before anything is extracted, and extraction goes to a private
//! temp directory.

pub mod plan;
pub mod survey;

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::bundler::{BundleMetadata, extract_bundle, is_safe_skill_name};
use crate::error::{Result, SubstrateError};
use crate::skills::DESCRIPTOR_FILE;

pub use plan::{ExecutionReport, INSTALL_RECORD_FILE, InstallPlan, PlanStep, build_plan, execute};
pub use survey::{Conflict, Recommendation, Severity, Survey, survey};

/// A skill ready to be copied into place.
#[derive(Debug)]
pub struct PreparedSource {
    pub name: String,
    /// Directory holding the skill files.
    pub dir: PathBuf,
    /// Where it came from, as given by the user.
    pub origin: PathBuf,
    pub metadata: Option<BundleMetadata>,
    // Keeps the extraction directory alive while installing.
    _extracted: Option<TempDir>,
}

impl PreparedSource {
    #[must_use]
    pub fn is_bundle(&self) -> bool {
        self.metadata.is_some()
    }
}

fn is_bundle_path(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    name.ends_with(".tar.gz") || name.ends_with(".tgz")
}

/// Resolve `source` into an installable skill directory.
///
/// Bundles are validated with checksum verification and unpacked under
/// `temp_root`; invalid bundles abort without touching disk.
pub fn prepare(source: &Path, temp_root: &Path) -> Result<PreparedSource> {
    if source.is_file() && is_bundle_path(source) {
        std::fs::create_dir_all(temp_root)?;
        let extracted = tempfile::Builder::new()
            .prefix("zo-substrate-install-")
            .tempdir_in(temp_root)?;
        let (metadata, _) = extract_bundle(source, extracted.path())?;
        if !is_safe_skill_name(&metadata.name) {
            return Err(SubstrateError::ValidationFailed(format!(
                "Invalid skill name in metadata.json: {:?}",
                metadata.name
            )));
        }
        debug!(bundle = %source.display(), skill = %metadata.name, "bundle extracted");
        return Ok(PreparedSource {
            name: metadata.name.clone(),
            dir: extracted.path().to_path_buf(),
            origin: source.to_path_buf(),
            metadata: Some(metadata),
            _extracted: Some(extracted),
        });
    }

    if !source.is_dir() {
        return Err(SubstrateError::SkillNotFound(source.to_path_buf()));
    }
    if !source.join(DESCRIPTOR_FILE).is_file() {
        return Err(SubstrateError::InvalidSkill(source.to_path_buf()));
    }
    let name = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| SubstrateError::SkillNotFound(source.to_path_buf()))?;
    Ok(PreparedSource {
        name,
        dir: source.to_path_buf(),
        origin: source.to_path_buf(),
        metadata: None,
        _extracted: None,
    })
}
