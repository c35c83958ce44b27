// ABOUTME: Container operations trait for the engine gateway.
// ABOUTME: Create, start, stop, remove, inspect, list and rename containers.

use super::shared_types::{ContainerSnapshot, CreateRequest, RemoveOptions};
use crate::types::ContainerId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;

/// Container lifecycle operations.
#[async_trait]
pub trait ContainerOps: Send + Sync {
    /// Create a container and return the engine's snapshot of it.
    async fn create_container(
        &self,
        request: &CreateRequest,
    ) -> Result<ContainerSnapshot, ContainerError>;

    /// Start a created container.
    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError>;

    /// Stop a running container, waiting up to `grace` before killing it.
    async fn stop_container(
        &self,
        id: &ContainerId,
        grace: Duration,
    ) -> Result<(), ContainerError>;

    /// Remove a container.
    async fn remove_container(
        &self,
        id: &ContainerId,
        options: RemoveOptions,
    ) -> Result<(), ContainerError>;

    /// Get the current snapshot of a container.
    async fn inspect_container(
        &self,
        id: &ContainerId,
    ) -> Result<ContainerSnapshot, ContainerError>;

    /// List containers matching the given filters.
    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError>;

    /// Rename a container.
    async fn rename_container(
        &self,
        id: &ContainerId,
        new_name: &str,
    ) -> Result<(), ContainerError>;
}

/// Filters for listing containers.
#[derive(Debug, Clone, Default)]
pub struct ContainerFilters {
    /// Filter by label (key=value).
    pub labels: HashMap<String, String>,
    /// Filter by name (partial match).
    pub name: Option<String>,
    /// Include stopped containers.
    pub all: bool,
}

impl ContainerFilters {
    pub fn all() -> Self {
        Self {
            all: true,
            ..Default::default()
        }
    }

    pub fn running() -> Self {
        Self::default()
    }
}

/// Summary information about a container, as returned by a listing.
#[derive(Debug, Clone)]
pub struct ContainerSummary {
    pub id: ContainerId,
    /// Primary name without the leading `/`.
    pub name: String,
    pub image: String,
    /// Engine state string ("running", "exited", ...).
    pub state: String,
    /// Status message ("Up 3 minutes").
    pub status: String,
    pub labels: HashMap<String, String>,
    pub created: Option<DateTime<Utc>>,
}

/// Errors from container operations.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("container not found: {0}")]
    NotFound(String),

    #[error("container already exists: {0}")]
    AlreadyExists(String),

    #[error("container not running: {0}")]
    NotRunning(String),

    #[error("container already running: {0}")]
    AlreadyRunning(String),

    #[error("image not found: {0}")]
    ImageNotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("engine error: {0}")]
    Engine(String),
}

impl ContainerError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ContainerError::NotFound(_))
    }
}
