// ABOUTME: Synchronous command execution inside a running container.
// ABOUTME: Starts the session in a task, waits for it to attach, then drains output lines.

use std::sync::Arc;

use snafu::ResultExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::engine::Engine;
use crate::engine::traits::{ExecConfig, ExecError};
use crate::types::ContainerId;

use super::error::{ExecSnafu, LifecycleError};
use super::handle::Container;

/// Buffer between the engine's output copy and the line reader.
const EXEC_PIPE_CAPACITY: usize = 64 * 1024;

/// Shell prefix used by `exec_sh`.
pub const SHELL: [&str; 2] = ["/bin/sh", "-c"];

impl<E: Engine> Container<E> {
    /// Run `cmd` in the container and return its output lines.
    ///
    /// Blocks until the command exits. A non-zero exit is reported as
    /// [`LifecycleError::Command`] carrying whatever the command printed.
    pub async fn exec(&self, cmd: &[String]) -> Result<Vec<String>, LifecycleError> {
        let id = self.require_id()?;
        execute(self.engine(), id, cmd).await
    }

    /// Run `cmd` through `/bin/sh -c`.
    pub async fn exec_sh(&self, cmd: &str) -> Result<Vec<String>, LifecycleError> {
        self.exec(&shell_command(cmd)).await
    }
}

pub(crate) fn shell_command(cmd: &str) -> Vec<String> {
    SHELL
        .iter()
        .map(|s| s.to_string())
        .chain(std::iter::once(cmd.to_string()))
        .collect()
}

/// The exec protocol: create, start in a task, wait for attach, drain to
/// EOF, join, inspect for the exit code.
pub(crate) async fn execute<E: Engine>(
    engine: &Arc<E>,
    container: &ContainerId,
    cmd: &[String],
) -> Result<Vec<String>, LifecycleError> {
    let short_id = container.short();

    let exec_id = engine
        .exec_create(container, &ExecConfig::capture(cmd))
        .await
        .context(ExecSnafu { short_id })?;
    tracing::debug!(container = %short_id, exec = %exec_id.short(), ?cmd, "exec created");

    let (reader, writer) = tokio::io::duplex(EXEC_PIPE_CAPACITY);
    let (started_tx, started_rx) = oneshot::channel();

    let task: JoinHandle<Result<(), ExecError>> = {
        let engine = Arc::clone(engine);
        let exec_id = exec_id.clone();
        tokio::spawn(async move { engine.exec_start(&exec_id, Box::pin(writer), started_tx).await })
    };

    if started_rx.await.is_err() {
        // The sender was dropped unfired: the session never attached.
        let result = join_start(task).await.and_then(|()| {
            Err(ExecError::Stream(
                "exec session ended before attaching".to_string(),
            ))
        });
        return result.context(ExecSnafu { short_id });
    }

    let mut lines = Vec::new();
    let mut segments = BufReader::new(reader).split(b'\n');
    while let Some(raw) = segments
        .next_segment()
        .await
        .map_err(|e| ExecError::Stream(e.to_string()))
        .context(ExecSnafu { short_id })?
    {
        let mut line = String::from_utf8_lossy(&raw).into_owned();
        if line.ends_with('\r') {
            line.pop();
        }
        lines.push(line);
    }

    join_start(task).await.context(ExecSnafu { short_id })?;

    let info = engine
        .exec_inspect(&exec_id)
        .await
        .context(ExecSnafu { short_id })?;
    let exit_code = info.exit_code.unwrap_or(0);
    tracing::debug!(container = %short_id, exit_code, lines = lines.len(), "exec finished");

    if exit_code != 0 {
        return Err(LifecycleError::Command {
            command: cmd.to_vec(),
            exit_code,
            output: lines,
        });
    }

    Ok(lines)
}

async fn join_start(task: JoinHandle<Result<(), ExecError>>) -> Result<(), ExecError> {
    match task.await {
        Ok(result) => result,
        Err(e) => Err(ExecError::Task(e.to_string())),
    }
}
