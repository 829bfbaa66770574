//! Bundle creation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use tracing::{debug, info};

use super::{BundleMetadata, METADATA_FILE, SCHEMA_VERSION, hash_bytes, hash_file};
use crate::error::{Result, SubstrateError};
use crate::skills::DESCRIPTOR_FILE;
use crate::utils::fs::list_files;

/// Inputs for [`create_bundle`] beyond the skill directory.
#[derive(Debug, Clone)]
pub struct BundleRequest {
    pub identity: String,
    pub version: String,
    pub notes: String,
    pub output_dir: PathBuf,
    /// Workspace revision recorded in the metadata.
    pub git_sha: String,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BundleOutcome {
    pub skill: String,
    pub version: String,
    /// Number of skill files packaged (excluding `metadata.json`).
    pub files: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    /// Digest of the archive itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    pub metadata: BundleMetadata,
    pub dry_run: bool,
}

/// Archive file name: `{skill}-v{version}-{YYYYMMDD}.tar.gz`.
#[must_use]
pub fn bundle_file_name(skill: &str, version: &str) -> String {
    let date = Utc::now().format("%Y%m%d");
    format!("{skill}-v{version}-{date}.tar.gz")
}

/// Archive member name for a relative path, always `/`-separated.
pub(crate) fn member_name(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Build the metadata record for `files` (relative to `skill_dir`).
pub fn build_metadata(
    skill_name: &str,
    skill_dir: &Path,
    files: &[PathBuf],
    request: &BundleRequest,
) -> Result<BundleMetadata> {
    let mut checksums = BTreeMap::new();
    let mut names = Vec::with_capacity(files.len());
    for rel in files {
        let name = member_name(rel);
        checksums.insert(name.clone(), hash_file(&skill_dir.join(rel))?);
        names.push(name);
    }
    Ok(BundleMetadata {
        schema_version: SCHEMA_VERSION.to_string(),
        name: skill_name.to_string(),
        version: request.version.clone(),
        exported_from: request.identity.clone(),
        exported_at: Utc::now().to_rfc3339(),
        git_sha: request.git_sha.clone(),
        files: names,
        checksums,
        notes: request.notes.clone(),
    })
}

/// Package a skill directory into a bundle.
///
/// In dry-run mode the full metadata is computed and nothing is written.
pub fn create_bundle(skill_dir: &Path, request: &BundleRequest) -> Result<BundleOutcome> {
    if !skill_dir.is_dir() {
        return Err(SubstrateError::SkillNotFound(skill_dir.to_path_buf()));
    }
    let skill_name = skill_dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| SubstrateError::SkillNotFound(skill_dir.to_path_buf()))?
        .to_string();

    // A junk-only directory reports as empty, not as descriptor-less.
    let files = list_files(skill_dir)?;
    if files.is_empty() {
        return Err(SubstrateError::EmptyBundle(skill_dir.to_path_buf()));
    }
    if !skill_dir.join(DESCRIPTOR_FILE).is_file() {
        return Err(SubstrateError::InvalidSkill(skill_dir.to_path_buf()));
    }

    let metadata = build_metadata(&skill_name, skill_dir, &files, request)?;

    if request.dry_run {
        debug!(skill = %skill_name, files = files.len(), "dry-run bundle");
        return Ok(BundleOutcome {
            skill: skill_name,
            version: request.version.clone(),
            files: files.len(),
            path: None,
            size_bytes: None,
            checksum: None,
            metadata,
            dry_run: true,
        });
    }

    std::fs::create_dir_all(&request.output_dir)?;
    let final_path = request
        .output_dir
        .join(bundle_file_name(&skill_name, &request.version));

    let staging = tempfile::NamedTempFile::new_in(&request.output_dir)?;
    write_archive(staging.as_file(), skill_dir, &files, &metadata)?;
    staging
        .persist(&final_path)
        .map_err(|err| SubstrateError::Archive(format!("persist {}: {}", final_path.display(), err.error)))?;

    let size_bytes = std::fs::metadata(&final_path)?.len();
    let checksum = hash_file(&final_path)?;
    info!(skill = %skill_name, path = %final_path.display(), size_bytes, "bundle created");

    Ok(BundleOutcome {
        skill: skill_name,
        version: request.version.clone(),
        files: files.len(),
        path: Some(final_path),
        size_bytes: Some(size_bytes),
        checksum: Some(checksum),
        metadata,
        dry_run: false,
    })
}

fn write_archive(
    out: &std::fs::File,
    skill_dir: &Path,
    files: &[PathBuf],
    metadata: &BundleMetadata,
) -> Result<()> {
    let encoder = GzEncoder::new(out, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);

    for rel in files {
        builder
            .append_path_with_name(skill_dir.join(rel), member_name(rel))
            .map_err(|err| SubstrateError::Archive(format!("add {}: {err}", rel.display())))?;
    }

    let payload = serde_json::to_vec_pretty(metadata)?;
    let mut header = tar::Header::new_gnu();
    header.set_size(payload.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(u64::try_from(Utc::now().timestamp()).unwrap_or_default());
    header.set_cksum();
    builder
        .append_data(&mut header, METADATA_FILE, payload.as_slice())
        .map_err(|err| SubstrateError::Archive(format!("add {METADATA_FILE}: {err}")))?;

    let encoder = builder
        .into_inner()
        .map_err(|err| SubstrateError::Archive(format!("finish tar: {err}")))?;
    encoder
        .finish()
        .map_err(|err| SubstrateError::Archive(format!("finish gzip: {err}")))?;
    Ok(())
}

/// Stored-vs-actual digest comparison for a single file.
#[must_use]
pub fn checksum_matches(expected: &str, bytes: &[u8]) -> bool {
    hash_bytes(bytes) == expected
}
