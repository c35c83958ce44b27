// ABOUTME: Engine type definitions for Docker and Podman endpoints.
// ABOUTME: EngineType, the detected endpoint, and the user override config.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client timeout used when the config does not set one.
pub const DEFAULT_ENGINE_TIMEOUT: Duration = Duration::from_secs(120);

/// The container engine flavour behind a socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineType {
    Docker,
    Podman,
}

impl std::fmt::Display for EngineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineType::Docker => write!(f, "docker"),
            EngineType::Podman => write!(f, "podman"),
        }
    }
}

/// A reachable engine endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineEndpoint {
    pub engine_type: EngineType,
    /// Path to the engine's unix socket.
    pub socket_path: String,
}

/// Explicit engine settings, overriding auto-detection.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Engine type (skips detection when set).
    #[serde(default, alias = "runtime")]
    pub engine: Option<EngineType>,
    /// Socket path (defaults per engine type).
    #[serde(default)]
    pub socket: Option<String>,
    /// Client request timeout.
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_timeout() -> Duration {
    DEFAULT_ENGINE_TIMEOUT
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            engine: None,
            socket: None,
            timeout: DEFAULT_ENGINE_TIMEOUT,
        }
    }
}
