//! Push/pull synchronization through the relay repository.
//!
//! Every run follows the same shape: resolve the remote, take a fresh clone
//! at the ephemeral path, copy skills in (push) or out (pull), then always
//! remove the clone. Last-sync state and the event log are only written once
//! the mutating steps went through.

pub mod pull;
pub mod push;
pub mod report;
pub mod state;

use std::path::PathBuf;

use tracing::warn;

use crate::config::{Environment, SubstrateConfig};
use crate::events::EventLog;
use crate::relay::{GitRelay, RelayRepository, RemoteLocation};

pub use report::{
    BackupRecord, InstallAction, InstallFailure, PlannedInstall, PullReport, PushReport,
};
pub use state::{PullState, PushState, StateRecord};

/// Options shared by push and pull.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Restrict the run to these skill names.
    pub skills: Option<Vec<String>>,
    pub dry_run: bool,
}

impl SyncOptions {
    fn filter(&self) -> Option<&[String]> {
        self.skills.as_deref().filter(|names| !names.is_empty())
    }
}

/// Sync engine over a relay implementation.
pub struct SyncEngine<'a, R: RelayRepository> {
    config: &'a SubstrateConfig,
    env: &'a Environment,
    relay: R,
}

impl<'a> SyncEngine<'a, GitRelay> {
    /// Engine backed by a git clone at the configured ephemeral path.
    #[must_use]
    pub fn with_git(config: &'a SubstrateConfig, env: &'a Environment) -> Self {
        let relay = GitRelay::new(config.ephemeral_clone_path(env), &config.identity.name);
        Self::new(config, env, relay)
    }
}

impl<'a, R: RelayRepository> SyncEngine<'a, R> {
    pub const fn new(config: &'a SubstrateConfig, env: &'a Environment, relay: R) -> Self {
        Self { config, env, relay }
    }

    pub const fn relay(&self) -> &R {
        &self.relay
    }

    pub fn into_relay(self) -> R {
        self.relay
    }

    fn remote(&self) -> RemoteLocation {
        RemoteLocation::resolve(&self.config.substrate, self.env.github_token.as_deref())
    }

    fn state_dir(&self) -> PathBuf {
        self.config.state_dir(self.env)
    }

    fn events(&self) -> EventLog {
        EventLog::new(&self.state_dir(), &self.config.identity.name)
    }

    /// Remove the clone; failures only warrant a warning.
    fn cleanup(&mut self) {
        if let Err(err) = self.relay.cleanup() {
            warn!(error = %err, "failed to remove ephemeral relay clone");
        }
    }
}

/// Entries of `available` selected by `filter`, in `available` order.
pub(crate) fn intersect(available: &[String], filter: Option<&[String]>) -> Vec<String> {
    match filter {
        Some(wanted) => available
            .iter()
            .filter(|name| wanted.contains(name))
            .cloned()
            .collect(),
        None => available.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_keeps_available_order() {
        let available = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let wanted = vec!["c".to_string(), "a".to_string(), "z".to_string()];
        assert_eq!(intersect(&available, Some(&wanted)), vec!["a", "c"]);
        assert_eq!(intersect(&available, None), available);
    }

    #[test]
    fn empty_filter_means_everything() {
        let options = SyncOptions {
            skills: Some(Vec::new()),
            dry_run: false,
        };
        assert!(options.filter().is_none());
    }
}
