//! Skill bundles: a `.tar.gz` of a skill's files plus `metadata.json`.

pub mod extract;
pub mod package;
pub mod validate;

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Result;

pub use extract::extract_bundle;
pub use package::{BundleOutcome, BundleRequest, create_bundle};
pub use validate::{ValidationReport, validate_bundle, verify_checksums};

pub const SCHEMA_VERSION: &str = "1.0";
pub const METADATA_FILE: &str = "metadata.json";
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Contents of `metadata.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BundleMetadata {
    #[serde(default)]
    pub schema_version: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub exported_from: String,
    #[serde(default)]
    pub exported_at: String,
    #[serde(default)]
    pub git_sha: String,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub checksums: BTreeMap<String, String>,
    #[serde(default)]
    pub notes: String,
}

/// `sha256:<hex>` digest of `bytes`.
#[must_use]
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

/// `sha256:<hex>` digest of a file, streamed.
pub fn hash_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    hash_reader(&mut file)
}

/// A skill name usable as one directory under the install root: a single
/// normal path segment, no separators, not hidden.
#[must_use]
pub fn is_safe_skill_name(name: &str) -> bool {
    if name.trim().is_empty() || name.starts_with('.') || name.contains(['/', '\\', ':']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

pub(crate) fn hash_reader(reader: &mut impl Read) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("sha256:{}", hex::encode(hasher.finalize())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn hash_bytes_is_prefixed_and_deterministic() {
        let first = hash_bytes(b"hello");
        assert_eq!(first, hash_bytes(b"hello"));
        assert_eq!(
            first,
            "sha256:2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn hash_file_matches_hash_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f");
        let data = vec![7u8; 20_000];
        std::fs::write(&path, &data).unwrap();
        assert_eq!(hash_file(&path).unwrap(), hash_bytes(&data));
    }

    #[test]
    fn single_byte_change_alters_digest() {
        assert_ne!(hash_bytes(b"print('a')"), hash_bytes(b"print('b')"));
    }

    #[test]
    fn hash_file_missing_is_io_error() {
        let dir = tempdir().unwrap();
        let err = hash_file(&dir.path().join("gone")).unwrap_err();
        assert!(matches!(err, crate::error::SubstrateError::Io(_)), "{err:?}");
    }

    #[test]
    fn skill_name_must_be_one_plain_segment() {
        use crate::test_utils::{TestCase, run_table_tests};

        let cases = vec![
            TestCase { name: "plain", input: "daily-brief", expected: true },
            TestCase { name: "dots inside", input: "v1.2-notes", expected: true },
            TestCase { name: "parent", input: "..", expected: false },
            TestCase { name: "parent prefix", input: "../victim", expected: false },
            TestCase { name: "nested", input: "a/b", expected: false },
            TestCase { name: "absolute", input: "/abs/path", expected: false },
            TestCase { name: "backslash", input: "a\\b", expected: false },
            TestCase { name: "drive", input: "C:x", expected: false },
            TestCase { name: "hidden", input: ".backups", expected: false },
            TestCase { name: "empty", input: " ", expected: false },
        ];
        run_table_tests(cases, is_safe_skill_name);
    }

    #[test]
    fn metadata_tolerates_missing_fields() {
        let meta: BundleMetadata = serde_json::from_str(r#"{"name":"x"}"#).unwrap();
        assert_eq!(meta.name, "x");
        assert!(meta.schema_version.is_empty());
        assert!(meta.checksums.is_empty());
    }
}
