use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{info, warn};

use super::report::{BackupRecord, InstallAction, InstallFailure, PlannedInstall, PullReport};
use super::state::{PullState, StateRecord};
use super::{SyncEngine, SyncOptions, intersect};
use crate::error::Result;
use crate::events::notify;
use crate::relay::{RelayManifest, RelayRepository, SKILLS_DIR, SyncFailure};
use crate::utils::fs::{copy_tree_filtered, move_dir};

/// Directory under the install dir holding replaced skills.
pub const BACKUP_DIR: &str = ".backups";

/// What happened to the previous local copy of a skill.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Replacement {
    pub backup: Option<PathBuf>,
    pub deleted: bool,
}

/// `<install_dir>/.backups/{name}.{%Y%m%d_%H%M%S}`, suffixed when taken.
#[must_use]
pub fn backup_path(install_dir: &Path, name: &str) -> PathBuf {
    let stamp = Utc::now().format("%Y%m%d_%H%M%S");
    let base = install_dir.join(BACKUP_DIR).join(format!("{name}.{stamp}"));
    if !base.exists() {
        return base;
    }
    (1..)
        .map(|n| install_dir.join(BACKUP_DIR).join(format!("{name}.{stamp}-{n}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or(base)
}

/// Install `source` as `<install_dir>/<name>`, backing up or deleting any
/// existing copy first. Junk files are not copied.
pub fn install_skill(
    source: &Path,
    install_dir: &Path,
    name: &str,
    backup_existing: bool,
) -> Result<Replacement> {
    let dest = install_dir.join(name);
    let mut replacement = Replacement::default();
    if dest.exists() {
        if backup_existing {
            let backup = backup_path(install_dir, name);
            move_dir(&dest, &backup)?;
            info!(skill = name, backup = %backup.display(), "backed up existing skill");
            replacement.backup = Some(backup);
        } else {
            std::fs::remove_dir_all(&dest)?;
            warn!(skill = name, "replaced existing skill without backup");
            replacement.deleted = true;
        }
    }
    copy_tree_filtered(source, &dest)?;
    Ok(replacement)
}

/// Visible skill directories under the relay's `Skills/`, sorted.
fn relay_skill_names(skills_root: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(skills_root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with('.') {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

impl<R: RelayRepository> SyncEngine<'_, R> {
    /// Install skills from the relay into the local install directory.
    pub fn pull(&mut self, options: &SyncOptions) -> Result<PullReport> {
        let outcome = self.pull_through_clone(options);
        self.cleanup();
        let report = outcome?;

        if report.success && !report.dry_run && !report.installed.is_empty() {
            let source = report
                .manifest
                .as_ref()
                .map(|manifest| manifest.source.clone())
                .filter(|source| !source.is_empty());
            let state = PullState {
                last_pull: Some(Utc::now().to_rfc3339()),
                pulled_skills: report.installed.clone(),
                substrate_sha: report.substrate_sha.clone(),
                source,
            };
            state.save(&self.state_dir())?;
            self.events().append(
                "pull",
                Some(serde_json::json!({
                    "skills": report.installed,
                    "substrate_sha": report.substrate_sha,
                })),
            )?;
            notify(
                &self.config.notifications,
                &format!(
                    "{} pulled {} skill(s) from {}",
                    self.config.identity.name,
                    report.installed.len(),
                    self.config.substrate.repo
                ),
            );
        }
        Ok(report)
    }

    fn pull_through_clone(&mut self, options: &SyncOptions) -> Result<PullReport> {
        let remote = self.remote();
        let branch = self.config.substrate.branch.clone();
        let root = match self.relay.clone_fresh(&remote, &branch) {
            Ok(root) => root,
            Err(err) => {
                warn!(error = %err, "relay clone failed");
                return Ok(PullReport::failed(SyncFailure::CloneFailed, err.to_string()));
            }
        };

        let mut report = PullReport {
            dry_run: options.dry_run,
            ..PullReport::default()
        };
        match RelayManifest::read(&root) {
            Ok(Some(manifest)) => report.manifest = Some(manifest),
            Ok(None) => report
                .warnings
                .push("No MANIFEST.json found in relay".to_string()),
            Err(err) => report
                .warnings
                .push(format!("Unreadable MANIFEST.json: {err}")),
        }
        for warning in &report.warnings {
            warn!("{warning}");
        }

        let skills_root = root.join(SKILLS_DIR);
        if !skills_root.is_dir() {
            report.success = true;
            report.message = Some("No skills in relay".to_string());
            return Ok(report);
        }

        let available = relay_skill_names(&skills_root)?;
        let targets = intersect(&available, options.filter());
        if targets.is_empty() {
            if let Some(wanted) = options.filter() {
                let mut failed = PullReport::failed(
                    SyncFailure::NoMatch,
                    format!("no relay skills match: {}", wanted.join(", ")),
                );
                failed.available = available;
                failed.warnings = report.warnings;
                failed.manifest = report.manifest;
                return Ok(failed);
            }
            report.success = true;
            report.message = Some("No skills in relay".to_string());
            return Ok(report);
        }
        report.available = available;

        let install_dir = self.config.install_dir(self.env);
        report.planned = targets
            .iter()
            .map(|name| PlannedInstall {
                name: name.clone(),
                action: if install_dir.join(name).exists() {
                    InstallAction::Update
                } else {
                    InstallAction::New
                },
            })
            .collect();
        if options.dry_run {
            report.success = true;
            return Ok(report);
        }

        std::fs::create_dir_all(&install_dir)?;
        let backup_existing = self.config.pull.backup_existing;
        for name in &targets {
            match install_skill(&skills_root.join(name), &install_dir, name, backup_existing) {
                Ok(replacement) => {
                    if let Some(path) = replacement.backup {
                        report.backups.push(BackupRecord {
                            skill: name.clone(),
                            path,
                        });
                    }
                    if replacement.deleted {
                        report.replaced.push(name.clone());
                    }
                    report.installed.push(name.clone());
                }
                Err(err) => {
                    warn!(skill = %name, error = %err, "failed to install skill");
                    report.failed.push(InstallFailure {
                        skill: name.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        report.substrate_sha = self.relay.head_revision().ok();
        report.success = report.failed.is_empty();
        info!(
            installed = report.installed.len(),
            failed = report.failed.len(),
            "pulled skills from relay"
        );
        Ok(report)
    }
}
