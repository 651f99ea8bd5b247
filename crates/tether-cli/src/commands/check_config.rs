//! `tether check-config`: validate a config file.

use std::path::Path;

use tether_engine::BridgeConfig;

use crate::output::StyledOutput;

pub fn execute(path: &Path) -> anyhow::Result<()> {
    let mut out = StyledOutput::new();
    match BridgeConfig::from_file(path) {
        Ok(config) => {
            out.success(&format!("{} is valid", path.display()))?;
            out.line(&format!("channel:   {}", config.bridge.channel))?;
            out.line(&format!("registrar: {}", config.bridge.registrar))?;
            out.line(&format!("access:    {}", config.access_policy()?.default_flags()))?;
            for (pattern, flags) in &config.access.types {
                out.line(&format!("  {} = {}", pattern, flags))?;
            }
            Ok(())
        }
        Err(err) => {
            out.failure(&err.to_string())?;
            Err(err.into())
        }
    }
}
