// ABOUTME: Local engine detection for Docker and Podman sockets.
// ABOUTME: Honors explicit config first, then probes Podman sockets before Docker.

use super::types::{EngineConfig, EngineEndpoint, EngineType};
use std::path::Path;

pub const ROOTFUL_PODMAN_SOCKET: &str = "/run/podman/podman.sock";
pub const DOCKER_SOCKET: &str = "/var/run/docker.sock";

/// Error during engine detection.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("no container engine found (checked Podman and Docker sockets)")]
    NoEngineFound,

    #[error("configured socket does not exist: {0}")]
    SocketMissing(String),
}

/// Detect a container engine on the local system.
///
/// Detection order:
/// 1. Rootless Podman socket (`/run/user/$UID/podman/podman.sock`)
/// 2. Rootful Podman socket (`/run/podman/podman.sock`)
/// 3. Docker socket (`/var/run/docker.sock`)
pub fn detect_local() -> Result<EngineEndpoint, DetectionError> {
    let rootless = current_uid().map(|uid| rootless_podman_socket(&uid));
    let candidates = rootless
        .into_iter()
        .map(|socket| (EngineType::Podman, socket))
        .chain([
            (EngineType::Podman, ROOTFUL_PODMAN_SOCKET.to_string()),
            (EngineType::Docker, DOCKER_SOCKET.to_string()),
        ]);

    for (engine_type, socket_path) in candidates {
        if Path::new(&socket_path).exists() {
            return Ok(EngineEndpoint {
                engine_type,
                socket_path,
            });
        }
    }

    Err(DetectionError::NoEngineFound)
}

/// Resolve the endpoint to connect to.
///
/// An explicit engine type in `config` wins; its socket defaults to the
/// engine's standard path. A socket given without a type is assumed to be
/// Docker-compatible unless its path mentions podman.
pub fn resolve_endpoint(config: &EngineConfig) -> Result<EngineEndpoint, DetectionError> {
    match (config.engine, &config.socket) {
        (Some(engine_type), socket) => {
            let socket_path = socket
                .clone()
                .unwrap_or_else(|| default_socket_path(engine_type));
            Ok(EngineEndpoint {
                engine_type,
                socket_path,
            })
        }
        (None, Some(socket)) => {
            if !Path::new(socket).exists() {
                return Err(DetectionError::SocketMissing(socket.clone()));
            }
            let engine_type = if socket.contains("podman") {
                EngineType::Podman
            } else {
                EngineType::Docker
            };
            Ok(EngineEndpoint {
                engine_type,
                socket_path: socket.clone(),
            })
        }
        (None, None) => detect_local(),
    }
}

fn default_socket_path(engine_type: EngineType) -> String {
    match engine_type {
        EngineType::Docker => DOCKER_SOCKET.to_string(),
        EngineType::Podman => ROOTFUL_PODMAN_SOCKET.to_string(),
    }
}

fn rootless_podman_socket(uid: &str) -> String {
    format!("/run/user/{uid}/podman/podman.sock")
}

fn current_uid() -> Option<String> {
    std::env::var("UID").ok().or_else(|| {
        let status = std::fs::read_to_string("/proc/self/status").ok()?;
        status
            .lines()
            .find_map(|line| line.strip_prefix("Uid:"))
            .and_then(|rest| rest.split_whitespace().next())
            .map(str::to_string)
    })
}
