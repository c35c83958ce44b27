// ABOUTME: Exec operations trait for the engine gateway.
// ABOUTME: Create, start and inspect command sessions inside running containers.

use super::shared_types::{ExecConfig, ExecInfo, ExecOutput, ExecStarted};
use crate::types::{ContainerId, ExecId};
use async_trait::async_trait;

/// Exec operations: run commands in containers.
#[async_trait]
pub trait ExecOps: Send + Sync {
    /// Create an exec session without starting it.
    async fn exec_create(
        &self,
        container: &ContainerId,
        config: &ExecConfig,
    ) -> Result<ExecId, ExecError>;

    /// Start a created exec session and copy its combined stdout and stderr
    /// into `output` until the command exits.
    ///
    /// `started` is fired once the session is attached. Implementations drop
    /// `output` when they return, which is what tells the reader the command
    /// is done. If the session cannot be started, `started` is dropped unfired.
    async fn exec_start(
        &self,
        exec_id: &ExecId,
        output: ExecOutput,
        started: ExecStarted,
    ) -> Result<(), ExecError>;

    /// Inspect an exec session, mainly for its exit code.
    async fn exec_inspect(&self, exec_id: &ExecId) -> Result<ExecInfo, ExecError>;
}

/// Errors from exec operations.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    #[error("container not running: {0}")]
    ContainerNotRunning(String),

    #[error("exec instance not found: {0}")]
    ExecNotFound(String),

    #[error("exec output stream failed: {0}")]
    Stream(String),

    #[error("exec task failed: {0}")]
    Task(String),

    #[error("engine error: {0}")]
    Engine(String),
}
