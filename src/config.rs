use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SubstrateError};

/// Name this tool installs itself under; excluded from export by default.
pub const SELF_SKILL_NAME: &str = "zo-substrate";

pub const CONFIG_FILE_NAME: &str = "substrate.yaml";

const DEFAULT_WORKSPACE: &str = "/home/workspace";

/// Parsed `substrate.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubstrateConfig {
    #[serde(default)]
    pub identity: PeerConfig,
    #[serde(default)]
    pub partner: PeerConfig,
    #[serde(default)]
    pub substrate: RelayConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub pull: PullConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub state: StateConfig,
}

/// One side of the exchange.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeerConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub handle: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelayConfig {
    /// `owner/name` of the relay repository.
    #[serde(default)]
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default)]
    pub clone_method: CloneMethod,
    /// Full remote URL; bypasses URL construction from `repo` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            repo: String::new(),
            branch: default_branch(),
            clone_method: CloneMethod::default(),
            url: None,
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum CloneMethod {
    #[default]
    Https,
    Ssh,
}

impl CloneMethod {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Https => "https",
            Self::Ssh => "ssh",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportConfig {
    /// Explicit skill list; when non-empty, auto detection is bypassed.
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default = "default_true")]
    pub auto_detect: bool,
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            skills: Vec::new(),
            auto_detect: true,
            exclude: default_exclude(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PullConfig {
    #[serde(default = "default_install_dir")]
    pub install_dir: String,
    #[serde(default = "default_true")]
    pub backup_existing: bool,
    #[serde(default)]
    pub auto_pull: bool,
}

impl Default for PullConfig {
    fn default() -> Self {
        Self {
            install_dir: default_install_dir(),
            backup_existing: true,
            auto_pull: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_notify_method")]
    pub method: String,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            method: default_notify_method(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateConfig {
    /// State directory, relative to the workspace root.
    #[serde(default = "default_state_dir")]
    pub dir: String,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            dir: default_state_dir(),
        }
    }
}

fn default_branch() -> String {
    "main".to_string()
}

const fn default_true() -> bool {
    true
}

fn default_exclude() -> Vec<String> {
    vec![SELF_SKILL_NAME.to_string()]
}

fn default_install_dir() -> String {
    "Skills".to_string()
}

fn default_notify_method() -> String {
    "log".to_string()
}

fn default_state_dir() -> String {
    "data/zo-substrate".to_string()
}

impl SubstrateConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SubstrateError::ConfigNotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|err| SubstrateError::Config(format!("read config {}: {err}", path.display())))?;
        Self::from_yaml(&raw)
    }

    /// Parse config text, apply defaults and check required keys.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        let config: Self = if raw.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(raw)
                .map_err(|err| SubstrateError::Config(format!("parse config: {err}")))?
        };
        config.validate()?;
        Ok(config)
    }

    /// Collects every missing required key before failing.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        if self.identity.name.trim().is_empty() {
            errors.push("identity.name is required".to_string());
        }
        if self.partner.name.trim().is_empty() {
            errors.push("partner.name is required".to_string());
        }
        if self.substrate.repo.trim().is_empty() {
            errors.push("substrate.repo is required".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(SubstrateError::ConfigValidation(errors))
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_yaml::to_string(self)?;
        std::fs::write(path, raw)
            .map_err(|err| SubstrateError::Config(format!("write config {}: {err}", path.display())))?;
        Ok(())
    }

    /// Directory holding sync state, context snapshot and the event log.
    #[must_use]
    pub fn state_dir(&self, env: &Environment) -> PathBuf {
        env.workspace_root.join(&self.state.dir)
    }

    /// Directory pulled skills are installed into.
    #[must_use]
    pub fn install_dir(&self, env: &Environment) -> PathBuf {
        env.workspace_root.join(&self.pull.install_dir)
    }

    /// Fixed location of the throwaway relay clone.
    #[must_use]
    pub fn ephemeral_clone_path(&self, env: &Environment) -> PathBuf {
        let name = self.substrate.repo.replace('/', "_");
        env.temp_dir.join(format!("zo-substrate-{name}"))
    }
}

/// Process-level inputs, resolved once at startup and passed down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub workspace_root: PathBuf,
    pub github_token: Option<String>,
    pub temp_dir: PathBuf,
}

impl Environment {
    #[must_use]
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            github_token: None,
            temp_dir: std::env::temp_dir(),
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.github_token = token.filter(|t| !t.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    /// `<workspace>/Skills`, the directory skills are discovered in.
    #[must_use]
    pub fn skills_dir(&self) -> PathBuf {
        self.workspace_root.join("Skills")
    }

    /// Default config location inside the workspace.
    #[must_use]
    pub fn default_config_path(&self) -> PathBuf {
        self.skills_dir()
            .join(SELF_SKILL_NAME)
            .join("config")
            .join(CONFIG_FILE_NAME)
    }
}

/// Pick the workspace root: explicit override, then `/home/workspace` when it
/// exists, then the home directory.
#[must_use]
pub fn resolve_workspace_root(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    let default = PathBuf::from(DEFAULT_WORKSPACE);
    if default.is_dir() {
        return default;
    }
    dirs::home_dir().unwrap_or(default)
}
