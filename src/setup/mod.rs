//! Prerequisite checks and configuration bootstrap.

use std::path::{Path, PathBuf};
use std::process::Command;

use git2::{Repository, Signature};
use serde::Serialize;
use tracing::{debug, info, warn};
use which::which;

use crate::config::{
    CloneMethod, Environment, ExportConfig, PeerConfig, RelayConfig, SubstrateConfig,
};
use crate::error::{Result, SubstrateError};
use crate::relay::git::{build_callbacks, commit_with_parents};
use crate::relay::{RelayManifest, RemoteLocation, SKILLS_DIR};

const RELAY_DESCRIPTION: &str = "Zo-to-Zo substrate for skill exchange";

const RELAY_README: &str = "# Zo Substrate\n\n\
Shared substrate repository for Zo-to-Zo skill exchange.\n\n\
## Structure\n\n\
```\n\
Skills/          # Synced skills\n\
MANIFEST.json    # Auto-generated sync manifest\n\
```\n";

/// One external tool looked up on PATH.
#[derive(Debug, Clone, Serialize)]
pub struct ToolCheck {
    pub name: String,
    pub bin: String,
    pub path: Option<PathBuf>,
    pub version: Option<String>,
    pub present: bool,
}

impl ToolCheck {
    fn probe(name: &str, bin: &str) -> Self {
        let mut check = Self {
            name: name.to_string(),
            bin: bin.to_string(),
            path: None,
            version: None,
            present: false,
        };
        if let Ok(path) = which(bin) {
            check.present = true;
            check.version = Command::new(&path)
                .arg("--version")
                .output()
                .ok()
                .filter(|output| output.status.success())
                .and_then(|output| {
                    String::from_utf8_lossy(&output.stdout)
                        .lines()
                        .next()
                        .map(|line| line.trim().to_string())
                });
            check.path = Some(path);
        }
        check
    }
}

/// Where GitHub credentials come from.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GithubAuth {
    Token,
    GhCli,
    Missing,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrerequisiteReport {
    pub tools: Vec<ToolCheck>,
    pub github_auth: GithubAuth,
    pub issues: Vec<String>,
}

impl PrerequisiteReport {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }

    fn evaluate(tools: Vec<ToolCheck>, github_auth: GithubAuth) -> Self {
        let mut issues = Vec::new();
        for tool in tools.iter().filter(|tool| !tool.present) {
            match tool.bin.as_str() {
                "gh" => issues.push(
                    "GitHub CLI (gh) is not installed; it is needed for repo creation".to_string(),
                ),
                bin => issues.push(format!("{bin} is not installed or not in PATH")),
            }
        }
        if github_auth == GithubAuth::Missing {
            issues.push("No GITHUB_TOKEN and gh is not authenticated; need one or the other".into());
        }
        Self {
            tools,
            github_auth,
            issues,
        }
    }
}

/// `git` and `gh` on PATH plus a token or an authenticated `gh`.
#[must_use]
pub fn check_prerequisites(env: &Environment) -> PrerequisiteReport {
    let git = ToolCheck::probe("Git", "git");
    let gh = ToolCheck::probe("GitHub CLI", "gh");
    let github_auth = if env.github_token.is_some() {
        GithubAuth::Token
    } else if gh.present && gh_authenticated() {
        GithubAuth::GhCli
    } else {
        GithubAuth::Missing
    };
    PrerequisiteReport::evaluate(vec![git, gh], github_auth)
}

fn gh_authenticated() -> bool {
    Command::new("gh")
        .args(["auth", "status"])
        .output()
        .is_ok_and(|output| output.status.success())
}

/// Inputs of `setup init`.
#[derive(Debug, Clone)]
pub struct InitRequest {
    pub identity: String,
    pub partner: String,
    pub repo: String,
    pub identity_handle: String,
    pub partner_handle: String,
    pub clone_method: CloneMethod,
    pub skills: Vec<String>,
    pub create_repo: bool,
    pub public: bool,
    pub dry_run: bool,
}

impl InitRequest {
    /// The config this request would write.
    #[must_use]
    pub fn to_config(&self) -> SubstrateConfig {
        SubstrateConfig {
            identity: PeerConfig {
                name: self.identity.clone(),
                handle: self.identity_handle.clone(),
            },
            partner: PeerConfig {
                name: self.partner.clone(),
                handle: self.partner_handle.clone(),
            },
            substrate: RelayConfig {
                repo: self.repo.clone(),
                clone_method: self.clone_method,
                ..RelayConfig::default()
            },
            export: ExportConfig {
                skills: self.skills.clone(),
                ..ExportConfig::default()
            },
            ..SubstrateConfig::default()
        }
    }
}

/// What happened to the relay repository during `init`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum RepoOutcome {
    AlreadyExists,
    Created,
    WouldCreate,
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct InitOutcome {
    pub config_path: PathBuf,
    pub config: SubstrateConfig,
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<RepoOutcome>,
    /// Prerequisite issues, downgraded to warnings.
    pub warnings: Vec<String>,
}

/// Write the config (backing up any existing one) and optionally create the
/// relay repository. Nothing is written on a dry run.
pub fn init(env: &Environment, config_path: &Path, request: &InitRequest) -> Result<InitOutcome> {
    let prerequisites = check_prerequisites(env);
    for issue in &prerequisites.issues {
        warn!("{issue}");
    }

    let config = request.to_config();
    config.validate()?;

    let repo = request
        .create_repo
        .then(|| create_relay_repo(env, &config, request.public, request.dry_run));

    let backup = if request.dry_run {
        None
    } else {
        write_config(&config, config_path)?
    };

    Ok(InitOutcome {
        config_path: config_path.to_path_buf(),
        config,
        dry_run: request.dry_run,
        backup,
        repo,
        warnings: prerequisites.issues,
    })
}

/// Save `config`, moving an existing file to `substrate.yaml.backup`.
pub fn write_config(config: &SubstrateConfig, path: &Path) -> Result<Option<PathBuf>> {
    let backup = if path.exists() {
        let backup = path.with_extension("yaml.backup");
        std::fs::rename(path, &backup)?;
        info!(backup = %backup.display(), "backed up existing config");
        Some(backup)
    } else {
        None
    };
    config.save(path)?;
    info!(path = %path.display(), "config written");
    Ok(backup)
}

fn create_relay_repo(
    env: &Environment,
    config: &SubstrateConfig,
    public: bool,
    dry_run: bool,
) -> RepoOutcome {
    let repo = &config.substrate.repo;
    let exists = Command::new("gh")
        .args(["repo", "view", repo, "--json", "name"])
        .output()
        .is_ok_and(|output| output.status.success());
    if exists {
        return RepoOutcome::AlreadyExists;
    }
    if dry_run {
        return RepoOutcome::WouldCreate;
    }

    let visibility = if public { "--public" } else { "--private" };
    let created = Command::new("gh")
        .args(["repo", "create", repo, visibility, "--description", RELAY_DESCRIPTION])
        .output();
    match created {
        Ok(output) if output.status.success() => {}
        Ok(output) => {
            return RepoOutcome::Failed(String::from_utf8_lossy(&output.stderr).trim().to_string());
        }
        Err(err) => return RepoOutcome::Failed(format!("failed to run gh: {err}")),
    }

    let remote = RemoteLocation::resolve(&config.substrate, env.github_token.as_deref());
    let workdir = env.temp_dir.join(format!(
        "zo-substrate-seed-{}",
        repo.replace('/', "_")
    ));
    match seed_relay(&remote, &config.substrate.branch, &workdir) {
        Ok(commit) => {
            info!(repo = %repo, commit = %commit, "relay repository initialized");
            RepoOutcome::Created
        }
        Err(err) => RepoOutcome::Failed(format!("created but could not seed: {err}")),
    }
}

/// Clone an empty relay, add the base layout and push it to `branch`.
///
/// Returns the seed commit id. The working copy at `workdir` is removed.
pub fn seed_relay(remote: &RemoteLocation, branch: &str, workdir: &Path) -> Result<String> {
    crate::utils::fs::remove_dir_if_exists(workdir)?;
    let outcome = seed_in(remote, branch, workdir);
    if let Err(err) = crate::utils::fs::remove_dir_if_exists(workdir) {
        warn!(error = %err, "failed to remove relay seed checkout");
    }
    outcome
}

fn seed_in(remote: &RemoteLocation, branch: &str, workdir: &Path) -> Result<String> {
    let mut fetch = git2::FetchOptions::new();
    fetch.remote_callbacks(build_callbacks(&remote.auth));
    let repo = git2::build::RepoBuilder::new()
        .fetch_options(fetch)
        .clone(&remote.url, workdir)?;
    repo.set_head(&format!("refs/heads/{branch}"))?;

    std::fs::write(workdir.join("README.md"), RELAY_README)?;
    std::fs::create_dir_all(workdir.join(SKILLS_DIR))?;
    std::fs::write(workdir.join(SKILLS_DIR).join(".gitkeep"), "")?;
    RelayManifest::empty().write(workdir)?;

    let commit = commit_all(&repo, "Initialize substrate repo")?;
    debug!(commit = %commit, "seed commit created");

    let mut push_options = git2::PushOptions::new();
    push_options.remote_callbacks(build_callbacks(&remote.auth));
    let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
    repo.find_remote("origin")
        .map_err(|err| SubstrateError::Relay(format!("relay has no origin: {err}")))?
        .push(&[refspec], Some(&mut push_options))?;
    Ok(commit)
}

fn commit_all(repo: &Repository, message: &str) -> Result<String> {
    let mut index = repo.index()?;
    index.add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)?;
    index.write()?;
    let tree = repo.find_tree(index.write_tree()?)?;
    let signature = Signature::now("zo-substrate", "zo@zo.computer")?;
    Ok(commit_with_parents(repo, &signature, &tree, message)?.to_string())
}
