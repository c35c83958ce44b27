// ABOUTME: Shared data types used across engine trait definitions.
// ABOUTME: Create requests, container snapshots, exec settings and pull progress.

use crate::types::{ContainerId, ExecId};
use std::collections::BTreeMap;
use std::pin::Pin;
use tokio::io::AsyncWrite;
use tokio::sync::{mpsc, oneshot};

/// Port key (`6379/tcp`) to the host addresses it is published on.
pub type PortMap = BTreeMap<String, Vec<HostBinding>>;

/// Everything the engine needs to create a container.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateRequest {
    /// Name for the container.
    pub name: String,
    /// Process-level configuration.
    pub config: ContainerConfig,
    /// Host-level configuration (ports, binds, limits).
    pub host_config: HostConfig,
}

/// Process-level container configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerConfig {
    /// Image to run.
    pub image: String,
    /// Command to run (empty keeps the image default).
    pub cmd: Vec<String>,
    /// Environment in `KEY=value` form.
    pub env: Vec<String>,
    pub hostname: Option<String>,
    /// Ports exposed by the container, as `port/proto` keys.
    pub exposed_ports: Vec<String>,
}

/// Host-level container configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostConfig {
    pub port_bindings: PortMap,
    /// Bind mounts in `external:internal:mode` form.
    pub binds: Vec<String>,
    /// Legacy links in `name:alias` form.
    pub links: Vec<String>,
    /// Memory limit in bytes.
    pub memory: Option<i64>,
    /// Memory plus swap limit in bytes.
    pub memory_swap: Option<i64>,
    /// Relative CPU weight.
    pub cpu_shares: Option<i64>,
    /// CPUs the container may run on (`0-3`, `0,1`).
    pub cpuset_cpus: Option<String>,
}

/// One host address a container port is published on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostBinding {
    pub host_ip: String,
    pub host_port: String,
}

/// The engine's view of a container at the time it was inspected.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSnapshot {
    pub id: ContainerId,
    /// Container name without the leading `/`.
    pub name: String,
    pub image: String,
    pub state: ContainerState,
    pub running: bool,
    pub config: ContainerConfig,
    pub host_config: HostConfig,
    /// Host ports actually assigned by the engine.
    pub ports: PortMap,
}

/// Container state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
}

impl ContainerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerState::Created => "created",
            ContainerState::Running => "running",
            ContainerState::Paused => "paused",
            ContainerState::Restarting => "restarting",
            ContainerState::Removing => "removing",
            ContainerState::Exited => "exited",
            ContainerState::Dead => "dead",
        }
    }
}

impl std::fmt::Display for ContainerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for removing a container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveOptions {
    /// Kill the container first if it is running.
    pub force: bool,
    /// Remove anonymous volumes associated with the container.
    pub volumes: bool,
}

/// Runtime metadata.
#[derive(Debug, Clone)]
pub struct EngineMetadata {
    /// Engine name ("Docker", "Podman").
    pub name: String,
    pub version: String,
    pub api_version: String,
    pub os: String,
    pub arch: String,
}

/// Exec configuration for running commands in containers.
#[derive(Debug, Clone)]
pub struct ExecConfig {
    /// Command and arguments to run.
    pub cmd: Vec<String>,
    /// Environment variables.
    pub env: Vec<String>,
    pub working_dir: Option<String>,
    pub user: Option<String>,
    pub attach_stdin: bool,
    pub attach_stdout: bool,
    pub attach_stderr: bool,
    pub tty: bool,
    pub privileged: bool,
}

impl ExecConfig {
    /// Non-interactive exec capturing stdout and stderr.
    pub fn capture(cmd: &[String]) -> Self {
        Self {
            cmd: cmd.to_vec(),
            ..Default::default()
        }
    }
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            cmd: Vec::new(),
            env: Vec::new(),
            working_dir: None,
            user: None,
            attach_stdin: false,
            attach_stdout: true,
            attach_stderr: true,
            tty: false,
            privileged: false,
        }
    }
}

/// Exec instance information.
#[derive(Debug, Clone)]
pub struct ExecInfo {
    pub id: ExecId,
    pub running: bool,
    /// Exit code, once the command has finished.
    pub exit_code: Option<i64>,
    pub container_id: ContainerId,
}

/// Sink for the combined stdout and stderr of an exec session.
pub type ExecOutput = Pin<Box<dyn AsyncWrite + Send>>;

/// Fired once the exec session is attached and output may flow.
pub type ExecStarted = oneshot::Sender<()>;

/// One progress message emitted while pulling an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullProgress {
    /// Layer ID the message refers to, if any.
    pub layer: Option<String>,
    pub status: String,
    /// Human-readable progress bar or byte counts.
    pub progress: Option<String>,
}

impl std::fmt::Display for PullProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(layer) = &self.layer {
            write!(f, "{layer}: ")?;
        }
        f.write_str(&self.status)?;
        if let Some(progress) = &self.progress {
            write!(f, " {progress}")?;
        }
        Ok(())
    }
}

/// Receives pull progress as it happens.
pub type PullProgressSink = mpsc::UnboundedSender<PullProgress>;
