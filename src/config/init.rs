// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates dockyard.yml template files.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::{CONFIG_FILENAME, Config};

/// Write the template config into `dir`, refusing to overwrite unless `force`.
pub fn init_config(dir: &Path, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    std::fs::write(&config_path, Config::template())?;

    Ok(config_path)
}
