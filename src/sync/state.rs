use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, SubstrateError};

/// Last-sync record stored as pretty JSON in the state directory.
///
/// Records are overwritten wholesale. A missing or unreadable file loads as
/// the default ("never synced").
pub trait StateRecord: Serialize + DeserializeOwned + Default {
    const FILE_NAME: &'static str;

    fn path(state_dir: &Path) -> PathBuf {
        state_dir.join(Self::FILE_NAME)
    }

    fn load(state_dir: &Path) -> Self {
        let path = Self::path(state_dir);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "unreadable sync state");
                return Self::default();
            }
        };
        serde_json::from_str(&contents).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "corrupt sync state, ignoring");
            Self::default()
        })
    }

    fn save(&self, state_dir: &Path) -> Result<()> {
        let path = Self::path(state_dir);
        std::fs::create_dir_all(state_dir).map_err(|err| {
            SubstrateError::Config(format!("create state dir {}: {err}", state_dir.display()))
        })?;
        let rendered = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, rendered)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PushState {
    #[serde(default)]
    pub last_push: Option<String>,
    #[serde(default)]
    pub pushed_skills: Vec<String>,
    #[serde(default)]
    pub git_sha: Option<String>,
}

impl StateRecord for PushState {
    const FILE_NAME: &'static str = "last_push.json";
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PullState {
    #[serde(default)]
    pub last_pull: Option<String>,
    #[serde(default)]
    pub pulled_skills: Vec<String>,
    #[serde(default)]
    pub substrate_sha: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

impl StateRecord for PullState {
    const FILE_NAME: &'static str = "last_pull.json";
}
