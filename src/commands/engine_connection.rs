// ABOUTME: Shared helpers for loading config and connecting to the engine.
// ABOUTME: Used by every command that talks to a container engine.

use dockyard::config::Config;
use dockyard::engine::{self, BollardEngine, EngineConfig};
use dockyard::error::{Error, Result};
use dockyard::output::Output;
use std::path::Path;
use std::sync::Arc;

/// Load the config from an explicit path, or discover it in the working directory.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Config::discover(&std::env::current_dir()?),
    }
}

/// Engine settings from the config if there is one, defaults otherwise.
///
/// An explicitly given config path must exist.
pub fn load_engine_config(path: Option<&Path>) -> Result<EngineConfig> {
    match load_config(path) {
        Ok(config) => Ok(config.engine),
        Err(Error::ConfigNotFound(_)) if path.is_none() => Ok(EngineConfig::default()),
        Err(e) => Err(e),
    }
}

/// Detect and connect to the engine.
pub async fn connect_engine(config: &EngineConfig, output: &Output) -> Result<Arc<BollardEngine>> {
    output.progress("  → Connecting to container engine...");
    let engine = engine::connect(config).await?;
    output.progress(&format!("  → Connected to {}", engine.engine_type()));
    Ok(Arc::new(engine))
}
