// ABOUTME: Engine info trait for the engine gateway.
// ABOUTME: Query engine version and metadata, check connectivity.

use super::shared_types::EngineMetadata;
use async_trait::async_trait;

/// Engine metadata operations.
#[async_trait]
pub trait EngineInfo: Send + Sync {
    /// Get engine version and metadata.
    async fn info(&self) -> Result<EngineMetadata, EngineInfoError>;

    /// Ping the engine to check connectivity.
    async fn ping(&self) -> Result<(), EngineInfoError>;
}

/// Errors from engine info operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineInfoError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("engine error: {0}")]
    Engine(String),
}
