use std::path::{Path, PathBuf};

use git2::{IndexAddOption, Repository, RepositoryInitOptions, Signature};
use tempfile::TempDir;

use crate::config::{Environment, PeerConfig, RelayConfig, SubstrateConfig};

/// Isolated workspace with a `Skills/` directory and a private temp root.
pub struct WorkspaceFixture {
    pub temp_dir: TempDir,
    pub root: PathBuf,
}

impl WorkspaceFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().join("workspace");
        std::fs::create_dir_all(root.join("Skills")).expect("Failed to create Skills dir");
        Self { temp_dir, root }
    }

    /// Environment rooted at this workspace; ephemeral clones stay inside it.
    pub fn env(&self) -> Environment {
        Environment::new(&self.root).with_temp_dir(self.temp_dir.path().join("tmp"))
    }

    /// Config for `identity` relaying through `relay_url`.
    pub fn config(&self, identity: &str, relay_url: &Path) -> SubstrateConfig {
        SubstrateConfig {
            identity: PeerConfig {
                name: identity.to_string(),
                handle: format!("{identity}.zo.computer"),
            },
            partner: PeerConfig {
                name: "partner".to_string(),
                handle: String::new(),
            },
            substrate: RelayConfig {
                repo: "test/relay".to_string(),
                url: Some(relay_url.to_string_lossy().into_owned()),
                ..RelayConfig::default()
            },
            ..SubstrateConfig::default()
        }
    }

    pub fn create_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let full_path = self.root.join(relative_path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&full_path, content).expect("Failed to write file");
        full_path
    }

    /// `Skills/<name>/SKILL.md` with a frontmatter name.
    pub fn create_skill(&self, name: &str) -> PathBuf {
        self.create_file(
            &format!("Skills/{name}/SKILL.md"),
            &format!("---\nname: {name}\n---\n# {name}\n"),
        );
        self.root.join("Skills").join(name)
    }

    /// Path for a bare relay repository inside the fixture.
    pub fn relay_path(&self) -> PathBuf {
        self.temp_dir.path().join("relay.git")
    }
}

impl Default for WorkspaceFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a bare repository at `path` whose `main` holds `files`.
pub fn seed_bare_relay(path: &Path, files: &[(&str, &str)]) {
    let staging = TempDir::new().expect("Failed to create staging dir");
    let mut init = RepositoryInitOptions::new();
    init.initial_head("main");
    let repo = Repository::init_opts(staging.path(), &init).expect("init staging repo");

    for (name, body) in files {
        let full = staging.path().join(name);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(full, body).expect("write seed file");
    }

    let mut index = repo.index().expect("index");
    index
        .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
        .expect("stage seed");
    index.write().expect("write index");
    let tree = repo
        .find_tree(index.write_tree().expect("write tree"))
        .expect("find tree");
    let sig = Signature::now("seed", "seed@example.com").expect("signature");
    repo.commit(Some("HEAD"), &sig, &sig, "Initialize relay", &tree, &[])
        .expect("seed commit");

    let bare = Repository::init_bare(path).expect("init bare relay");
    let url = path.to_string_lossy().into_owned();
    let mut remote = repo.remote("origin", &url).expect("add origin");
    remote
        .push(&["refs/heads/main:refs/heads/main"], None)
        .expect("push seed");
    bare.set_head("refs/heads/main").expect("set bare head");
}
