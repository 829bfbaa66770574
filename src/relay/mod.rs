//! The relay repository: a shared git repository both peers clone, write
//! skills into, and read skills out of.

pub mod git;
pub mod manifest;

#[cfg(test)]
pub mod fake;

use std::path::PathBuf;

use serde::Serialize;

use crate::config::{CloneMethod, RelayConfig};
use crate::error::Result;

pub use git::GitRelay;
pub use manifest::{MANIFEST_FILE, RelayManifest};

/// Subdirectory of the relay holding one directory per skill.
pub const SKILLS_DIR: &str = "Skills";

/// Operations the sync engine needs from the relay.
///
/// Each sync works on a throwaway clone: `clone_fresh`, mutate the working
/// tree, optionally `commit` + `push`, then `cleanup`.
pub trait RelayRepository {
    /// Fresh clone of `branch`, replacing any previous copy at the working
    /// path. Returns the working tree root.
    fn clone_fresh(&mut self, remote: &RemoteLocation, branch: &str) -> Result<PathBuf>;

    /// True when the working tree differs from HEAD (untracked files count).
    fn has_changes(&self) -> Result<bool>;

    /// Stage everything and commit. Returns the new commit id.
    fn commit(&mut self, message: &str) -> Result<String>;

    /// Push `branch` to the remote it was cloned from.
    fn push(&mut self, branch: &str) -> Result<()>;

    fn head_revision(&self) -> Result<String>;

    /// Remove the working tree. Safe to call when nothing was cloned.
    fn cleanup(&mut self) -> Result<()>;
}

/// Credentials handed to git.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayAuth {
    /// Let libgit2 use its defaults (local paths, credential helpers).
    Default,
    Token { token: String },
    SshAgent,
}

/// Where the relay lives and how to authenticate.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteLocation {
    pub url: String,
    pub auth: RelayAuth,
}

impl std::fmt::Debug for RemoteLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let auth = match self.auth {
            RelayAuth::Default => "default",
            RelayAuth::Token { .. } => "token",
            RelayAuth::SshAgent => "ssh",
        };
        f.debug_struct("RemoteLocation")
            .field("url", &self.url)
            .field("auth", &auth)
            .finish()
    }
}

impl RemoteLocation {
    /// Build the remote from config.
    ///
    /// `ssh` yields `git@github.com:{repo}.git`; `https` yields
    /// `https://github.com/{repo}.git`, authenticated with the token when one
    /// is available. An explicit `substrate.url` is used verbatim.
    #[must_use]
    pub fn resolve(relay: &RelayConfig, token: Option<&str>) -> Self {
        let token_auth = || {
            token.map_or(RelayAuth::Default, |token| RelayAuth::Token {
                token: token.to_string(),
            })
        };

        if let Some(url) = relay.url.as_deref().filter(|u| !u.trim().is_empty()) {
            let auth = if url.starts_with("https://") {
                token_auth()
            } else if url.starts_with("git@") || url.starts_with("ssh://") {
                RelayAuth::SshAgent
            } else {
                RelayAuth::Default
            };
            return Self {
                url: url.to_string(),
                auth,
            };
        }

        match relay.clone_method {
            CloneMethod::Ssh => Self {
                url: format!("git@github.com:{}.git", relay.repo),
                auth: RelayAuth::SshAgent,
            },
            CloneMethod::Https => Self {
                url: format!("https://github.com/{}.git", relay.repo),
                auth: token_auth(),
            },
        }
    }
}

/// Structured reasons a sync stops early.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyncFailure {
    CloneFailed,
    PushFailed,
    NoMatch,
}

impl SyncFailure {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CloneFailed => "clone_failed",
            Self::PushFailed => "push_failed",
            Self::NoMatch => "no_match",
        }
    }
}

impl std::fmt::Display for SyncFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
