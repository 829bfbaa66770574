//! Outcomes of push and pull runs.
//!
//! Expected failures (`clone_failed`, `push_failed`, `no_match`) are carried
//! here as [`SyncFailure`] rather than raised as errors.

use std::path::PathBuf;

use serde::Serialize;

use crate::relay::{RelayManifest, SyncFailure};

#[derive(Debug, Clone, Default, Serialize)]
pub struct PushReport {
    pub success: bool,
    pub dry_run: bool,
    /// Skills copied into the relay and committed.
    pub copied: Vec<String>,
    /// Skills already identical on the relay.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unchanged: Vec<String>,
    /// Skills that vanished between discovery and copy.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
    /// Skills a dry run would export.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub planned: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub available: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SyncFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl PushReport {
    pub(crate) fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub(crate) fn failed(error: SyncFailure, detail: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error),
            detail: Some(detail.into()),
            ..Self::default()
        }
    }
}

/// Whether a pulled skill is new locally or replaces an existing copy.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InstallAction {
    New,
    Update,
}

impl InstallAction {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::New => "[NEW]",
            Self::Update => "[UPDATE]",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlannedInstall {
    pub name: String,
    pub action: InstallAction,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BackupRecord {
    pub skill: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InstallFailure {
    pub skill: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PullReport {
    pub success: bool,
    pub dry_run: bool,
    pub installed: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub planned: Vec<PlannedInstall>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub backups: Vec<BackupRecord>,
    /// Local copies deleted without a backup.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub replaced: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<InstallFailure>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub available: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<RelayManifest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub substrate_sha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SyncFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl PullReport {
    pub(crate) fn failed(error: SyncFailure, detail: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error),
            detail: Some(detail.into()),
            ..Self::default()
        }
    }
}
