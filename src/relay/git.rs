//! libgit2-backed relay clone.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use git2::{
    Commit, Cred, CredentialType, ErrorCode, IndexAddOption, RemoteCallbacks, Repository,
    Signature, StatusOptions,
};
use tracing::debug;

use super::{RelayAuth, RelayRepository, RemoteLocation};
use crate::error::{Result, SubstrateError};
use crate::utils::fs::remove_dir_if_exists;

/// Domain used for commit author emails.
pub const AUTHOR_DOMAIN: &str = "zo.computer";

/// Ephemeral clone of the relay at a fixed working path.
pub struct GitRelay {
    workdir: PathBuf,
    identity: String,
    repo: Option<Repository>,
    remote: Option<RemoteLocation>,
}

impl GitRelay {
    /// Relay clone at `workdir`, committing as `identity`.
    #[must_use]
    pub fn new(workdir: impl Into<PathBuf>, identity: impl Into<String>) -> Self {
        Self {
            workdir: workdir.into(),
            identity: identity.into(),
            repo: None,
            remote: None,
        }
    }

    #[must_use]
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn repo(&self) -> Result<&Repository> {
        self.repo
            .as_ref()
            .ok_or_else(|| SubstrateError::Relay("relay has not been cloned".to_string()))
    }

    fn signature(&self) -> Result<Signature<'static>> {
        let email = format!("{}@{AUTHOR_DOMAIN}", self.identity);
        Ok(Signature::now(&self.identity, &email)?)
    }
}

impl RelayRepository for GitRelay {
    fn clone_fresh(&mut self, remote: &RemoteLocation, branch: &str) -> Result<PathBuf> {
        self.repo = None;
        remove_dir_if_exists(&self.workdir)?;
        if let Some(parent) = self.workdir.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut fetch = git2::FetchOptions::new();
        fetch.remote_callbacks(build_callbacks(&remote.auth));

        // Only the requested branch is fetched.
        let refspec = format!("+refs/heads/{branch}:refs/remotes/origin/{branch}");
        let mut builder = git2::build::RepoBuilder::new();
        builder.fetch_options(fetch);
        builder.branch(branch);
        builder.remote_create(move |repo, name, url| repo.remote_with_fetch(name, url, &refspec));

        debug!(url = %remote.url, branch, path = %self.workdir.display(), "cloning relay");
        let repo = builder.clone(&remote.url, &self.workdir)?;
        self.repo = Some(repo);
        self.remote = Some(remote.clone());
        Ok(self.workdir.clone())
    }

    fn has_changes(&self) -> Result<bool> {
        let repo = self.repo()?;
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);
        let statuses = repo.statuses(Some(&mut opts))?;
        Ok(!statuses.is_empty())
    }

    fn commit(&mut self, message: &str) -> Result<String> {
        let signature = self.signature()?;
        let repo = self.repo()?;

        let mut index = repo.index()?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"].iter(), None)?;
        index.write()?;
        let tree_id = index.write_tree()?;
        let tree = repo.find_tree(tree_id)?;

        let oid = commit_with_parents(repo, &signature, &tree, message)?;
        debug!(commit = %oid, "committed relay changes");
        Ok(oid.to_string())
    }

    fn push(&mut self, branch: &str) -> Result<()> {
        let repo = self.repo()?;
        let auth = self
            .remote
            .as_ref()
            .map_or(RelayAuth::Default, |remote| remote.auth.clone());

        let rejected: Rc<RefCell<Vec<String>>> = Rc::default();
        let mut callbacks = build_callbacks(&auth);
        let sink = Rc::clone(&rejected);
        callbacks.push_update_reference(move |refname, status| {
            if let Some(status) = status {
                sink.borrow_mut().push(format!("{refname}: {status}"));
            }
            Ok(())
        });

        let mut push_options = git2::PushOptions::new();
        push_options.remote_callbacks(callbacks);

        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
        let mut origin = repo.find_remote("origin")?;
        origin.push(&[refspec], Some(&mut push_options))?;
        drop(push_options);

        let rejected = rejected.borrow();
        if rejected.is_empty() {
            Ok(())
        } else {
            Err(SubstrateError::Relay(format!(
                "push rejected: {}",
                rejected.join("; ")
            )))
        }
    }

    fn head_revision(&self) -> Result<String> {
        let commit = self.repo()?.head()?.peel_to_commit()?;
        Ok(commit.id().to_string())
    }

    fn cleanup(&mut self) -> Result<()> {
        self.repo = None;
        self.remote = None;
        remove_dir_if_exists(&self.workdir)
    }
}

/// Commit `tree` onto HEAD, handling an unborn branch.
pub(crate) fn commit_with_parents(
    repo: &Repository,
    signature: &Signature<'_>,
    tree: &git2::Tree<'_>,
    message: &str,
) -> Result<git2::Oid> {
    let parents = match repo.head() {
        Ok(head) => match head.target() {
            Some(oid) => vec![repo.find_commit(oid)?],
            None => Vec::new(),
        },
        Err(err) if matches!(err.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
            Vec::new()
        }
        Err(err) => return Err(SubstrateError::Git(err)),
    };

    let parent_refs: Vec<&Commit<'_>> = parents.iter().collect();
    let oid = repo.commit(Some("HEAD"), signature, signature, message, tree, &parent_refs)?;
    Ok(oid)
}

pub(crate) fn build_callbacks(auth: &RelayAuth) -> RemoteCallbacks<'static> {
    let auth = auth.clone();
    let mut ssh_attempts = 0u8;
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |_url, username_from_url, allowed| match &auth {
        RelayAuth::Default => Cred::default(),
        RelayAuth::Token { token } => Cred::userpass_plaintext("x-access-token", token),
        RelayAuth::SshAgent => {
            let user = username_from_url.unwrap_or("git");
            if allowed.contains(CredentialType::USERNAME) {
                return Cred::username(user);
            }
            ssh_attempts += 1;
            match ssh_attempts {
                1 => Cred::ssh_key_from_agent(user),
                2 => default_ssh_key().map_or_else(
                    || Err(git2::Error::from_str("no ssh key found in ~/.ssh")),
                    |key| Cred::ssh_key(user, None, &key, None),
                ),
                _ => Err(git2::Error::from_str("ssh authentication failed")),
            }
        }
    });
    callbacks
}

fn default_ssh_key() -> Option<PathBuf> {
    let ssh_dir = dirs::home_dir()?.join(".ssh");
    ["id_ed25519", "id_rsa"]
        .iter()
        .map(|name| ssh_dir.join(name))
        .find(|path| path.is_file())
}
