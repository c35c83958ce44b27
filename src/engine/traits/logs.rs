// ABOUTME: Log operations trait for the engine gateway.
// ABOUTME: Stream container logs with tail, follow and timestamp options.

use crate::types::ContainerId;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// A boxed stream of log lines.
pub type LogStream = Pin<Box<dyn Stream<Item = Result<LogLine, LogError>> + Send>>;

/// Log streaming operations.
#[async_trait]
pub trait LogOps: Send + Sync {
    /// Stream logs from a container. With `follow` set the stream stays open
    /// until the caller drops it.
    async fn container_logs(
        &self,
        id: &ContainerId,
        opts: &LogOptions,
    ) -> Result<LogStream, LogError>;
}

/// Options for log streaming.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub stdout: bool,
    pub stderr: bool,
    /// Follow log output (like `tail -f`).
    pub follow: bool,
    pub timestamps: bool,
    /// Number of lines to show from the end; `None` shows everything.
    pub tail: Option<u64>,
}

impl LogOptions {
    /// Both streams, followed, with timestamps.
    pub fn follow_all() -> Self {
        Self {
            stdout: true,
            stderr: true,
            follow: true,
            timestamps: true,
            tail: None,
        }
    }

    /// The last `n` lines of both streams, without following.
    pub fn tail(n: u64) -> Self {
        Self {
            stdout: true,
            stderr: true,
            follow: false,
            timestamps: false,
            tail: Some(n),
        }
    }

    /// Engine tail spec: a line count or `all`.
    pub fn tail_spec(&self) -> String {
        self.tail
            .map(|n| n.to_string())
            .unwrap_or_else(|| "all".to_string())
    }
}

/// A single log line from a container.
#[derive(Debug, Clone)]
pub struct LogLine {
    pub content: String,
    pub source: LogSource,
}

/// Which container stream a log line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSource {
    Stdout,
    Stderr,
}

/// Errors from log operations.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    #[error("stream error: {0}")]
    Stream(String),

    #[error("engine error: {0}")]
    Engine(String),
}
