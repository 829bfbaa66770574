//! E2E fixture: one isolated workspace driving the `substrate` binary.

use std::path::{Path, PathBuf};
use std::process::Output;

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// Isolated workspace with its own config, temp dir and no GitHub token.
pub struct E2EFixture {
    pub scenario_name: String,
    pub temp_dir: TempDir,
    pub root: PathBuf,
    pub config_path: PathBuf,
    step_count: usize,
}

impl E2EFixture {
    /// Workspace for `identity`, relaying through the repository at `relay`.
    pub fn new(scenario_name: &str, identity: &str, relay: &Path) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().join("workspace");
        std::fs::create_dir_all(root.join("Skills")).expect("Failed to create Skills dir");
        std::fs::create_dir_all(temp_dir.path().join("tmp")).expect("Failed to create tmp dir");

        let config_path = root.join("Skills/zo-substrate/config/substrate.yaml");
        let config = format!(
            "identity:\n  name: {identity}\npartner:\n  name: partner\nsubstrate:\n  repo: test/relay\n  url: {}\n",
            relay.display()
        );
        std::fs::create_dir_all(config_path.parent().expect("config parent"))
            .expect("Failed to create config dir");
        std::fs::write(&config_path, config).expect("Failed to write config");

        Self {
            scenario_name: scenario_name.to_string(),
            temp_dir,
            root,
            config_path,
            step_count: 0,
        }
    }

    pub fn log_step(&mut self, description: &str) {
        self.step_count += 1;
        eprintln!("[{}] step {}: {description}", self.scenario_name, self.step_count);
    }

    pub fn create_skill(&self, name: &str, body: &str) -> PathBuf {
        let dir = self.root.join("Skills").join(name);
        std::fs::create_dir_all(&dir).expect("Failed to create skill dir");
        std::fs::write(dir.join("SKILL.md"), body).expect("Failed to write SKILL.md");
        dir
    }

    pub fn write_file(&self, relative_path: &str, content: &str) {
        let path = self.root.join(relative_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    pub fn read_file(&self, relative_path: &str) -> String {
        std::fs::read_to_string(self.root.join(relative_path)).expect("Failed to read file")
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("substrate").expect("substrate binary");
        cmd.env("ZO_WORKSPACE", &self.root)
            .env("SUBSTRATE_CONFIG", &self.config_path)
            .env("TMPDIR", self.temp_dir.path().join("tmp"))
            .env_remove("GITHUB_TOKEN")
            .env_remove("SUBSTRATE_LOG")
            .env_remove("RUST_LOG");
        cmd
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.command().args(args).output().expect("run substrate")
    }

    /// Run with `-m` and parse stdout as JSON.
    pub fn run_json(&self, args: &[&str]) -> (bool, Value) {
        let mut full = vec!["-m"];
        full.extend_from_slice(args);
        let output = self.run(&full);
        let json = serde_json::from_slice(&output.stdout).unwrap_or_else(|err| {
            panic!(
                "[{}] invalid JSON from {:?}: {err}\nstdout: {}\nstderr: {}",
                self.scenario_name,
                args,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            )
        });
        (output.status.success(), json)
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.join("data/zo-substrate")
    }
}
