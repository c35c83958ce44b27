// ABOUTME: Image operations trait for the engine gateway.
// ABOUTME: Check for local images, pull them with progress, and remove them.

use super::shared_types::PullProgressSink;
use crate::types::ImageRef;
use async_trait::async_trait;

/// Image operations: pull, check existence, remove.
#[async_trait]
pub trait ImageOps: Send + Sync {
    /// Pull an image, forwarding progress messages to `progress` when given.
    async fn pull_image(
        &self,
        reference: &ImageRef,
        progress: Option<&PullProgressSink>,
    ) -> Result<(), ImageError>;

    /// Check if an image exists locally.
    async fn image_exists(&self, reference: &ImageRef) -> Result<bool, ImageError>;

    /// Remove an image.
    async fn remove_image(&self, reference: &ImageRef, force: bool) -> Result<(), ImageError>;
}

/// Errors from image operations.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("image not found: {0}")]
    NotFound(String),

    #[error("pull failed: {0}")]
    PullFailed(String),

    #[error("image in use, cannot remove: {0}")]
    InUse(String),

    #[error("engine error: {0}")]
    Engine(String),
}
