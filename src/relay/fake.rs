//! In-memory relay for engine tests: the "remote" is a plain directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{RelayRepository, RemoteLocation};
use crate::error::{Result, SubstrateError};
use crate::utils::fs::{copy_tree, remove_dir_if_exists};

#[derive(Debug, Default)]
pub struct FakeRelay {
    pub remote_dir: PathBuf,
    pub workdir: PathBuf,
    pub fail_clone: bool,
    pub fail_push: bool,
    pub commits: Vec<String>,
    pub pushes: Vec<String>,
    pub cleanups: usize,
    cloned: bool,
}

impl FakeRelay {
    pub fn new(remote_dir: impl Into<PathBuf>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            remote_dir: remote_dir.into(),
            workdir: workdir.into(),
            ..Self::default()
        }
    }
}

fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let rel = entry.path().strip_prefix(root).ok()?.to_path_buf();
            let bytes = std::fs::read(entry.path()).ok()?;
            Some((rel, bytes))
        })
        .collect()
}

impl RelayRepository for FakeRelay {
    fn clone_fresh(&mut self, _remote: &RemoteLocation, _branch: &str) -> Result<PathBuf> {
        if self.fail_clone {
            return Err(SubstrateError::Relay("repository not found".to_string()));
        }
        remove_dir_if_exists(&self.workdir)?;
        if self.remote_dir.exists() {
            copy_tree(&self.remote_dir, &self.workdir)?;
        } else {
            std::fs::create_dir_all(&self.workdir)?;
        }
        self.cloned = true;
        Ok(self.workdir.clone())
    }

    fn has_changes(&self) -> Result<bool> {
        Ok(snapshot(&self.workdir) != snapshot(&self.remote_dir))
    }

    fn commit(&mut self, message: &str) -> Result<String> {
        self.commits.push(message.to_string());
        Ok(format!("fake-{}", self.commits.len()))
    }

    fn push(&mut self, branch: &str) -> Result<()> {
        if self.fail_push {
            return Err(SubstrateError::Relay("push rejected".to_string()));
        }
        remove_dir_if_exists(&self.remote_dir)?;
        copy_tree(&self.workdir, &self.remote_dir)?;
        self.pushes.push(branch.to_string());
        Ok(())
    }

    fn head_revision(&self) -> Result<String> {
        if !self.cloned {
            return Err(SubstrateError::Relay("relay has not been cloned".to_string()));
        }
        Ok(format!("fake-{}", self.commits.len()))
    }

    fn cleanup(&mut self) -> Result<()> {
        self.cleanups += 1;
        self.cloned = false;
        remove_dir_if_exists(&self.workdir)
    }
}
