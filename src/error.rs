// ABOUTME: Application-wide error types for dockyard.
// ABOUTME: Uses thiserror for the config and CLI layer; lifecycle errors pass through.

use std::path::PathBuf;
use thiserror::Error;

use crate::container::LifecycleError;
use crate::engine::EngineConnectError;
use crate::engine::traits::EngineInfoError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("unknown container: {0}")]
    UnknownContainer(String),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Connect(#[from] EngineConnectError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineInfoError),
}

pub type Result<T> = std::result::Result<T, Error>;
