// ABOUTME: Container engine gateway for Docker and Podman.
// ABOUTME: Capability traits, the bollard implementation and local endpoint detection.

mod bollard;
mod detection;
mod error;
pub mod traits;
mod types;

pub use bollard::BollardEngine;
pub use detection::{DOCKER_SOCKET, DetectionError, ROOTFUL_PODMAN_SOCKET, detect_local, resolve_endpoint};
pub use error::{EngineConnectError, EngineConnectErrorKind};
pub use traits::Engine;
pub use types::{DEFAULT_ENGINE_TIMEOUT, EngineConfig, EngineEndpoint, EngineType};

use traits::EngineInfo;

/// Resolve the local endpoint, connect to it and check that it answers.
pub async fn connect(config: &EngineConfig) -> Result<BollardEngine, EngineConnectError> {
    let endpoint = resolve_endpoint(config)?;
    tracing::debug!(
        engine = %endpoint.engine_type,
        socket = %endpoint.socket_path,
        "connecting to container engine"
    );

    let engine = BollardEngine::connect(&endpoint, config.timeout)?;
    engine.ping().await?;
    Ok(engine)
}
