//! Unpacking of bundles that already passed validation.

use std::fs::File;
use std::path::Path;

use flate2::read::GzDecoder;

use super::{BundleMetadata, METADATA_FILE, ValidationReport, verify_checksums};
use crate::error::{Result, SubstrateError};

/// Verify `bundle` and unpack its skill files into `dest`.
///
/// `metadata.json` is not written out; it is returned instead.
pub fn extract_bundle(bundle: &Path, dest: &Path) -> Result<(BundleMetadata, ValidationReport)> {
    let report = verify_checksums(bundle);
    if !report.valid {
        return Err(SubstrateError::ValidationFailed(report.errors.join("; ")));
    }
    let metadata = report
        .metadata
        .clone()
        .ok_or_else(|| SubstrateError::ValidationFailed(format!("{METADATA_FILE} unreadable")))?;

    std::fs::create_dir_all(dest)?;
    let mut archive = tar::Archive::new(GzDecoder::new(File::open(bundle)?));
    let entries = archive
        .entries()
        .map_err(|err| SubstrateError::Archive(format!("read {}: {err}", bundle.display())))?;
    for entry in entries {
        let mut entry =
            entry.map_err(|err| SubstrateError::Archive(format!("read entry: {err}")))?;
        let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        if name.trim_start_matches("./") == METADATA_FILE {
            continue;
        }
        // unpack_in refuses members that would land outside `dest`
        let unpacked = entry
            .unpack_in(dest)
            .map_err(|err| SubstrateError::Archive(format!("unpack {name}: {err}")))?;
        if !unpacked {
            return Err(SubstrateError::ValidationFailed(format!(
                "Dangerous path in archive: {name}"
            )));
        }
    }
    Ok((metadata, report))
}
