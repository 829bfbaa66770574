//! Git utilities

use std::path::Path;
use std::process::Command;

/// Placeholder recorded when the workspace is not a git checkout.
pub const UNKNOWN_REVISION: &str = "unknown";

/// HEAD commit of the repository at `path`, via `git rev-parse HEAD`.
#[must_use]
pub fn head_sha_in(path: impl AsRef<Path>) -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(path)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let sha = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if sha.is_empty() { None } else { Some(sha) }
}

/// Workspace revision for manifests and state records.
#[must_use]
pub fn workspace_revision(workspace: impl AsRef<Path>) -> String {
    head_sha_in(workspace).unwrap_or_else(|| UNKNOWN_REVISION.to_string())
}

/// Check if directory is a git repository
pub fn is_repo(path: impl AsRef<Path>) -> bool {
    path.as_ref().join(".git").exists()
}
