pub mod app;
pub mod bundler;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod install;
pub mod relay;
pub mod setup;
pub mod skills;
pub mod sync;
pub mod test_utils;
pub mod utils;

pub use error::{Result, SubstrateError};

/// Package version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
