// ABOUTME: Lifecycle error types with SNAFU pattern.
// ABOUTME: Wraps engine gateway failures with the operation and container they hit.

use snafu::Snafu;

use crate::engine::traits::{ContainerError, ExecError, ImageError, LogError};

/// Failure of a container handle or pool operation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum LifecycleError {
    #[snafu(display("invalid container configuration: {reason}"))]
    Configuration { reason: String },

    #[snafu(display("container {name} has no engine id (not created or already removed)"))]
    NotFound { name: String },

    #[snafu(display("failed to create container {name}: {source}"))]
    Create { name: String, source: ContainerError },

    #[snafu(display("failed to start container {short_id}: {source}"))]
    Start {
        short_id: String,
        source: ContainerError,
    },

    #[snafu(display("failed to stop container {short_id}: {source}"))]
    Stop {
        short_id: String,
        source: ContainerError,
    },

    #[snafu(display("failed to remove container {name} ({short_id}): {source}"))]
    Remove {
        name: String,
        short_id: String,
        source: ContainerError,
    },

    #[snafu(display("failed to inspect container {short_id}: {source}"))]
    Refresh {
        short_id: String,
        source: ContainerError,
    },

    #[snafu(display("failed to list containers: {source}"))]
    List { source: ContainerError },

    #[snafu(display("failed to rename container {from} to {to}: {source}"))]
    Rename {
        from: String,
        to: String,
        source: ContainerError,
    },

    #[snafu(display("failed to exec in container {short_id}: {source}"))]
    Exec { short_id: String, source: ExecError },

    #[snafu(display("failed to read logs of container {short_id}: {source}"))]
    Logs { short_id: String, source: LogError },

    #[snafu(display("failed to download image {image}: {source}"))]
    Download { image: String, source: ImageError },

    #[snafu(display("run {name}: create step failed: {source}"))]
    RunCreate {
        name: String,
        source: Box<LifecycleError>,
    },

    #[snafu(display("run {name}: start step failed: {source}"))]
    RunStart {
        name: String,
        source: Box<LifecycleError>,
    },

    #[snafu(display("command {command:?} exited with code {exit_code}"))]
    Command {
        command: Vec<String>,
        exit_code: i64,
        /// Lines the command printed before exiting.
        output: Vec<String>,
    },

    #[snafu(display("task for container {name} ended without reporting"))]
    Aborted { name: String },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleErrorKind {
    /// Bad input; retrying will not help.
    Configuration,
    /// The operation needs an engine id the handle does not have.
    NotFound,
    /// The engine gateway reported a failure.
    Engine,
    /// A command ran and exited non-zero.
    Command,
    /// A pool task died without reporting.
    Aborted,
}

impl LifecycleError {
    pub fn kind(&self) -> LifecycleErrorKind {
        match self {
            LifecycleError::Configuration { .. } => LifecycleErrorKind::Configuration,
            LifecycleError::NotFound { .. } => LifecycleErrorKind::NotFound,
            LifecycleError::Command { .. } => LifecycleErrorKind::Command,
            LifecycleError::Aborted { .. } => LifecycleErrorKind::Aborted,
            LifecycleError::RunCreate { source, .. } | LifecycleError::RunStart { source, .. } => {
                source.kind()
            }
            LifecycleError::Create { .. }
            | LifecycleError::Start { .. }
            | LifecycleError::Stop { .. }
            | LifecycleError::Remove { .. }
            | LifecycleError::Refresh { .. }
            | LifecycleError::List { .. }
            | LifecycleError::Rename { .. }
            | LifecycleError::Exec { .. }
            | LifecycleError::Logs { .. }
            | LifecycleError::Download { .. } => LifecycleErrorKind::Engine,
        }
    }

    /// Exit code of a failed command, if this is a command failure.
    pub fn exit_code(&self) -> Option<i64> {
        match self {
            LifecycleError::Command { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }
}
