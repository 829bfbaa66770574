use std::path::Path;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::report::PushReport;
use super::state::{PushState, StateRecord};
use super::{SyncEngine, SyncOptions};
use crate::error::Result;
use crate::events::notify;
use crate::relay::{RelayManifest, RelayRepository, SKILLS_DIR, SyncFailure};
use crate::skills::{self, Skill};
use crate::utils::fs::{copy_tree_filtered, remove_dir_if_exists};
use crate::utils::git::workspace_revision;

/// Skill names listed in a commit subject before eliding.
const COMMIT_NAME_LIMIT: usize = 5;

/// `Sync from {identity}: a, b, c, d, e (+N more)`.
#[must_use]
pub fn commit_message(identity: &str, skills: &[String]) -> String {
    let shown = skills
        .iter()
        .take(COMMIT_NAME_LIMIT)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let mut message = format!("Sync from {identity}: {shown}");
    if skills.len() > COMMIT_NAME_LIMIT {
        message.push_str(&format!(" (+{} more)", skills.len() - COMMIT_NAME_LIMIT));
    }
    message
}

impl<R: RelayRepository> SyncEngine<'_, R> {
    /// Export local skills to the relay.
    pub fn push(&mut self, options: &SyncOptions) -> Result<PushReport> {
        let discovered = skills::discover(self.env, &self.config.export)?;
        let available: Vec<String> = discovered.iter().map(|s| s.name.clone()).collect();

        let selected = skills::apply_filter(discovered, options.filter());
        if selected.is_empty() {
            if let Some(wanted) = options.filter() {
                let mut report = PushReport::failed(
                    SyncFailure::NoMatch,
                    format!("no local skills match: {}", wanted.join(", ")),
                );
                report.available = available;
                return Ok(report);
            }
            info!("no skills to push");
            return Ok(PushReport::succeeded("No skills to push"));
        }

        let names: Vec<String> = selected.iter().map(|s| s.name.clone()).collect();
        if options.dry_run {
            return Ok(PushReport {
                success: true,
                dry_run: true,
                planned: names,
                ..PushReport::default()
            });
        }

        let outcome = self.push_through_clone(&selected);
        self.cleanup();
        let report = outcome?;

        if report.success {
            let state = PushState {
                last_push: Some(Utc::now().to_rfc3339()),
                pushed_skills: report.copied.clone(),
                git_sha: Some(workspace_revision(&self.env.workspace_root)),
            };
            state.save(&self.state_dir())?;
            self.events().append(
                "push",
                Some(serde_json::json!({
                    "skills": report.copied,
                    "unchanged": report.unchanged,
                    "commit": report.commit,
                })),
            )?;
            notify(
                &self.config.notifications,
                &format!(
                    "{} pushed {} skill(s) to {}",
                    self.config.identity.name,
                    report.copied.len(),
                    self.config.substrate.repo
                ),
            );
        }
        Ok(report)
    }

    fn push_through_clone(&mut self, selected: &[Skill]) -> Result<PushReport> {
        let remote = self.remote();
        let branch = self.config.substrate.branch.clone();
        let root = match self.relay.clone_fresh(&remote, &branch) {
            Ok(root) => root,
            Err(err) => {
                warn!(error = %err, "relay clone failed");
                return Ok(PushReport::failed(SyncFailure::CloneFailed, err.to_string()));
            }
        };

        let skills_root = root.join(SKILLS_DIR);
        std::fs::create_dir_all(&skills_root)?;

        let mut copied = Vec::new();
        let mut skipped = Vec::new();
        for skill in selected {
            if !skill.abs_path.is_dir() {
                warn!(skill = %skill.name, "skill disappeared before copy");
                skipped.push(skill.name.clone());
                continue;
            }
            let files = copy_into_relay(&skill.abs_path, &skills_root.join(&skill.name))?;
            debug!(skill = %skill.name, files, "copied skill into relay");
            copied.push(skill.name.clone());
        }

        if copied.is_empty() {
            let mut report = PushReport::succeeded("No skills to push");
            report.skipped = skipped;
            return Ok(report);
        }

        // Compared before MANIFEST.json is rewritten, whose timestamp always differs.
        let changed = match self.relay.has_changes() {
            Ok(changed) => changed,
            Err(err) => return Ok(PushReport::failed(SyncFailure::PushFailed, err.to_string())),
        };
        if !changed {
            info!("relay already up to date");
            let mut report = PushReport::succeeded("No changes to push");
            report.unchanged = copied;
            report.skipped = skipped;
            return Ok(report);
        }

        let manifest = RelayManifest::new(
            &self.config.identity.name,
            &self.config.identity.handle,
            &workspace_revision(&self.env.workspace_root),
            &copied,
        );
        manifest.write(&root)?;

        let message = commit_message(&self.config.identity.name, &copied);
        let commit = match self.relay.commit(&message) {
            Ok(commit) => commit,
            Err(err) => return Ok(PushReport::failed(SyncFailure::PushFailed, err.to_string())),
        };
        if let Err(err) = self.relay.push(&branch) {
            warn!(error = %err, "relay push failed");
            return Ok(PushReport::failed(SyncFailure::PushFailed, err.to_string()));
        }

        info!(skills = copied.len(), commit = %commit, "pushed skills to relay");
        Ok(PushReport {
            success: true,
            copied,
            skipped,
            commit: Some(commit),
            message: Some(message),
            ..PushReport::default()
        })
    }
}

fn copy_into_relay(src: &Path, dest: &Path) -> Result<usize> {
    remove_dir_if_exists(dest)?;
    copy_tree_filtered(src, dest)
}
