//! Bundle validation.
//!
//! Reads the archive index in place; nothing is extracted to disk.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use serde::Serialize;
use tracing::debug;

use super::{BundleMetadata, METADATA_FILE, SCHEMA_VERSION, hash_reader, is_safe_skill_name};
use crate::skills::DESCRIPTOR_FILE;

/// Outcome of validating an archive. Errors imply invalid; warnings do not.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub skill_name: Option<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(skip)]
    pub metadata: Option<BundleMetadata>,
}

impl ValidationReport {
    fn finish(mut self) -> Self {
        self.valid = self.errors.is_empty();
        self
    }
}

/// Everything learned from one pass over the archive.
#[derive(Default)]
struct ArchiveIndex {
    members: Vec<String>,
    metadata_raw: Option<Vec<u8>>,
    digests: BTreeMap<String, String>,
}

/// Validate manifest shape and member paths.
#[must_use]
pub fn validate_bundle(path: &Path) -> ValidationReport {
    validate(path, false)
}

/// [`validate_bundle`] plus per-file checksum verification against the
/// stored metadata.
#[must_use]
pub fn verify_checksums(path: &Path) -> ValidationReport {
    validate(path, true)
}

fn validate(path: &Path, verify: bool) -> ValidationReport {
    let mut report = ValidationReport::default();

    if !path.is_file() {
        report.errors.push("Bundle file not found".to_string());
        return report.finish();
    }

    let index = match read_index(path, verify) {
        Ok(index) => index,
        Err(err) => {
            report.errors.push(format!("Invalid tarball: {err}"));
            return report.finish();
        }
    };

    match &index.metadata_raw {
        None => report.errors.push(format!("Missing {METADATA_FILE} in bundle")),
        Some(raw) => match serde_json::from_slice::<BundleMetadata>(raw) {
            Err(err) => report.errors.push(format!("Unreadable {METADATA_FILE}: {err}")),
            Ok(metadata) => {
                check_metadata(&metadata, &mut report);
                report.metadata = Some(metadata);
            }
        },
    }

    if !index.members.iter().any(|m| m == DESCRIPTOR_FILE) {
        report.warnings.push(format!("No {DESCRIPTOR_FILE} in bundle root"));
    }

    for member in &index.members {
        if is_dangerous_member(member) {
            report.errors.push(format!("Dangerous path in archive: {member}"));
        }
    }

    if verify {
        if let Some(metadata) = report.metadata.clone() {
            check_digests(&metadata, &index.digests, &mut report);
        }
    }

    debug!(
        path = %path.display(),
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "bundle validated"
    );
    report.finish()
}

fn check_metadata(metadata: &BundleMetadata, report: &mut ValidationReport) {
    if metadata.name.trim().is_empty() {
        report
            .errors
            .push(format!("{METADATA_FILE} missing 'name' field"));
    } else if !is_safe_skill_name(&metadata.name) {
        report
            .errors
            .push(format!("Invalid skill name in {METADATA_FILE}: {}", metadata.name));
    } else {
        report.skill_name = Some(metadata.name.clone());
    }
    if metadata.schema_version != SCHEMA_VERSION {
        report.warnings.push(format!(
            "Unexpected schema version: {}",
            if metadata.schema_version.is_empty() {
                "none"
            } else {
                metadata.schema_version.as_str()
            }
        ));
    }
    if metadata.checksums.is_empty() {
        report
            .warnings
            .push("No checksums in metadata, cannot verify integrity".to_string());
    }
}

fn check_digests(
    metadata: &BundleMetadata,
    digests: &BTreeMap<String, String>,
    report: &mut ValidationReport,
) {
    for (file, expected) in &metadata.checksums {
        match digests.get(file) {
            None => report.errors.push(format!("Missing file in archive: {file}")),
            Some(actual) if actual != expected => {
                report.errors.push(format!("Checksum mismatch: {file}"));
            }
            Some(_) => {}
        }
    }
    let declared: BTreeSet<&String> = metadata.checksums.keys().collect();
    for file in digests.keys() {
        if file != METADATA_FILE && !declared.contains(file) {
            report.warnings.push(format!("Missing checksum: {file}"));
        }
    }
}

fn read_index(path: &Path, hash_members: bool) -> std::io::Result<ArchiveIndex> {
    let file = File::open(path)?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    let mut index = ArchiveIndex::default();

    for entry in archive.entries()? {
        let mut entry = entry?;
        let raw_name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        let name = normalize_member(&raw_name);
        let is_file = entry.header().entry_type().is_file();

        if is_file && name == METADATA_FILE {
            let mut buf = Vec::new();
            entry.read_to_end(&mut buf)?;
            index.metadata_raw = Some(buf);
        } else if is_file && hash_members {
            let digest = hash_reader(&mut entry).map_err(std::io::Error::other)?;
            index.digests.insert(name.clone(), digest);
        }
        index.members.push(name);
    }
    Ok(index)
}

/// Drop a leading `./` so `./SKILL.md` and `SKILL.md` compare equal.
fn normalize_member(name: &str) -> String {
    let trimmed = name.strip_prefix("./").unwrap_or(name);
    trimmed.trim_end_matches('/').to_string()
}

/// Absolute paths, drive prefixes and `..` segments escape the install root.
#[must_use]
pub fn is_dangerous_member(member: &str) -> bool {
    if member.starts_with('/') || member.starts_with('\\') {
        return true;
    }
    let bytes = member.as_bytes();
    if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
        return true;
    }
    member.split(['/', '\\']).any(|segment| segment == "..")
}
