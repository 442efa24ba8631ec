//! Command implementations.

mod info;
mod run;
mod validate;

pub use info::run_info;
pub use run::run_scenario;
pub use validate::run_validate;

use std::path::Path;

use anyhow::{Context, Result};
use contracts::EngineConfig;
use tracing::info;

use crate::error::CliError;

/// Load the engine config from `path`, or fall back to the defaults.
pub(crate) fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    if !path.exists() {
        return Err(CliError::config_not_found(path).into());
    }
    let config = config_loader::ConfigLoader::load_from_path(path)
        .map_err(CliError::from)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    info!(config = %path.display(), "Configuration loaded");
    Ok(config)
}
