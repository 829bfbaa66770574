//! Filesystem utilities.
//!
//! Helper functions for file operations.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Result, SubstrateError};

/// Directory and file names that never travel with a skill.
pub const SKIP_NAMES: &[&str] = &["__pycache__", ".git", "node_modules", ".DS_Store"];

/// True for names excluded from bundles and relay copies.
#[must_use]
pub fn is_skipped_name(name: &str) -> bool {
    SKIP_NAMES.contains(&name) || name.ends_with(".pyc")
}

/// True when any component of `rel` is a skipped name.
#[must_use]
pub fn is_skipped_path(rel: &Path) -> bool {
    rel.components()
        .any(|c| c.as_os_str().to_str().is_some_and(is_skipped_name))
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Read a file to string, returning None if it doesn't exist.
pub fn read_optional(path: impl AsRef<Path>) -> Result<Option<String>> {
    let path = path.as_ref();
    if path.exists() {
        Ok(Some(std::fs::read_to_string(path)?))
    } else {
        Ok(None)
    }
}

/// Remove a directory tree if present.
pub fn remove_dir_if_exists(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        std::fs::remove_dir_all(path)?;
    }
    Ok(())
}

/// Regular files under `root`, relative to it, skipping junk, sorted.
pub fn list_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !entry.file_name().to_str().is_some_and(is_skipped_name)
        });
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(root)
            .map_err(|err| SubstrateError::Config(format!("strip prefix: {err}")))?
            .to_path_buf();
        files.push(rel);
    }
    files.sort();
    Ok(files)
}

/// Copy `src` into `dest` (which must not exist yet), skipping junk.
///
/// Returns the number of files copied.
pub fn copy_tree_filtered(src: &Path, dest: &Path) -> Result<usize> {
    std::fs::create_dir_all(dest)?;
    let mut copied = 0;
    let walker = WalkDir::new(src)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !entry.file_name().to_str().is_some_and(is_skipped_name)
        });
    for entry in walker {
        let entry = entry?;
        if entry.depth() == 0 {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|err| SubstrateError::Config(format!("strip prefix: {err}")))?;
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Copy a tree without filtering, used for faithful backups.
pub fn copy_tree(src: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|err| SubstrateError::Config(format!("strip prefix: {err}")))?;
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Move a directory, falling back to copy + delete across filesystems.
pub fn move_dir(src: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if std::fs::rename(src, dest).is_ok() {
        return Ok(());
    }
    copy_tree(src, dest)?;
    std::fs::remove_dir_all(src)?;
    Ok(())
}

/// True when `dir` exists and has at least one entry.
#[must_use]
pub fn dir_has_entries(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    // =========================================================================
    // ensure_dir / read_optional
    // =========================================================================

    #[test]
    fn ensure_dir_creates_nested_directories() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("a").join("b").join("c");

        ensure_dir(&dir).unwrap();
        assert!(dir.is_dir());
        ensure_dir(&dir).unwrap();
    }

    #[test]
    fn read_optional_missing_returns_none() {
        let temp = TempDir::new().unwrap();
        assert!(read_optional(temp.path().join("nope")).unwrap().is_none());
        write(&temp.path().join("yes"), "hi");
        assert_eq!(read_optional(temp.path().join("yes")).unwrap().as_deref(), Some("hi"));
    }

    // =========================================================================
    // skip rules
    // =========================================================================

    #[test]
    fn skip_rules_match_exact_names_and_pyc() {
        assert!(is_skipped_name(".git"));
        assert!(is_skipped_name("__pycache__"));
        assert!(is_skipped_name("node_modules"));
        assert!(is_skipped_name(".DS_Store"));
        assert!(is_skipped_name("module.pyc"));
        assert!(!is_skipped_name(".github"));
        assert!(!is_skipped_name(".gitignore"));
        assert!(is_skipped_path(Path::new("scripts/__pycache__/x.py")));
        assert!(!is_skipped_path(Path::new("scripts/run.py")));
    }

    // =========================================================================
    // listing and copying
    // =========================================================================

    #[test]
    fn list_files_is_sorted_and_filtered() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(&root.join("SKILL.md"), "skill");
        write(&root.join("scripts/b.py"), "b");
        write(&root.join("scripts/a.py"), "a");
        write(&root.join("scripts/a.pyc"), "junk");
        write(&root.join(".git/HEAD"), "junk");
        write(&root.join("node_modules/x/index.js"), "junk");

        let files = list_files(root).unwrap();
        assert_eq!(
            files,
            vec![
                PathBuf::from("SKILL.md"),
                PathBuf::from("scripts/a.py"),
                PathBuf::from("scripts/b.py"),
            ]
        );
    }

    #[test]
    fn copy_tree_filtered_skips_junk() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let dest = temp.path().join("dest");
        write(&src.join("SKILL.md"), "skill");
        write(&src.join("scripts/run.py"), "print()");
        write(&src.join("__pycache__/run.cpython.pyc"), "junk");
        write(&src.join(".DS_Store"), "junk");

        let copied = copy_tree_filtered(&src, &dest).unwrap();
        assert_eq!(copied, 2);
        assert!(dest.join("SKILL.md").exists());
        assert!(dest.join("scripts/run.py").exists());
        assert!(!dest.join("__pycache__").exists());
        assert!(!dest.join(".DS_Store").exists());
    }

    #[test]
    fn move_dir_relocates_contents() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("skill");
        write(&src.join("SKILL.md"), "original");
        let dest = temp.path().join(".backups").join("skill.1");

        move_dir(&src, &dest).unwrap();
        assert!(!src.exists());
        assert_eq!(std::fs::read_to_string(dest.join("SKILL.md")).unwrap(), "original");
    }

    #[test]
    fn dir_has_entries_detects_empty_dirs() {
        let temp = TempDir::new().unwrap();
        assert!(!dir_has_entries(temp.path()));
        assert!(!dir_has_entries(&temp.path().join("missing")));
        write(&temp.path().join("file"), "x");
        assert!(dir_has_entries(temp.path()));
    }
}
