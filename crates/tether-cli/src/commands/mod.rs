//! Subcommand implementations.

pub mod call;
pub mod check_config;
pub mod serve;
pub mod types;

use std::path::Path;

use anyhow::Context;
use tether_engine::BridgeConfig;

/// Load the config file if one was given, defaults otherwise.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<BridgeConfig> {
    match path {
        Some(path) => BridgeConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(BridgeConfig::default()),
    }
}
