//! Application context shared by every command.

use std::path::PathBuf;

use crate::cli::{Cli, OutputFormat};
use crate::config::{Environment, SubstrateConfig, resolve_workspace_root};
use crate::error::Result;

/// Process inputs resolved once from flags and environment.
pub struct AppContext {
    pub env: Environment,
    pub config_path: PathBuf,
    pub robot_mode: bool,
    pub output_format: OutputFormat,
    pub verbosity: u8,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Self {
        let root = resolve_workspace_root(cli.workspace.clone());
        let token = std::env::var("GITHUB_TOKEN").ok();
        let env = Environment::new(root).with_token(token);
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| env.default_config_path());
        let output_format = cli.output_format();

        Self {
            env,
            config_path,
            robot_mode: output_format.is_machine_readable(),
            output_format,
            verbosity: cli.verbose,
        }
    }

    /// Load and validate the config file; commands that need identities call this.
    pub fn config(&self) -> Result<SubstrateConfig> {
        SubstrateConfig::load(&self.config_path)
    }
}
