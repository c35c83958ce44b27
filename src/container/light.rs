// ABOUTME: Listing-level container views and the trait shared with full handles.
// ABOUTME: Light views promote themselves to a full handle through a fresh inspect.

use std::sync::Arc;

use async_trait::async_trait;
use snafu::ResultExt;

use crate::engine::Engine;
use crate::engine::traits::{ContainerFilters, ContainerSummary};
use crate::types::ContainerId;

use super::error::{LifecycleError, ListSnafu, RefreshSnafu};
use super::handle::Container;

/// What callers can ask of any container, hydrated or not.
#[async_trait]
pub trait ContainerView: Send + Sync {
    /// Engine id, empty when the container does not exist yet.
    fn id(&self) -> &str;
    fn short_id(&self) -> &str;
    fn image(&self) -> &str;
    fn name(&self) -> &str;
    async fn is_running(&self) -> Result<bool, LifecycleError>;
    async fn exec_sh(&self, cmd: &str) -> Result<Vec<String>, LifecycleError>;
}

#[async_trait]
impl<E: Engine> ContainerView for Container<E> {
    fn id(&self) -> &str {
        Container::id(self).map(|id| id.as_str()).unwrap_or_default()
    }

    fn short_id(&self) -> &str {
        Container::short_id(self)
    }

    fn image(&self) -> &str {
        Container::image(self)
    }

    fn name(&self) -> &str {
        Container::name(self)
    }

    /// Last observed state; call `refresh` first for a fresh answer.
    async fn is_running(&self) -> Result<bool, LifecycleError> {
        Ok(Container::is_running(self))
    }

    async fn exec_sh(&self, cmd: &str) -> Result<Vec<String>, LifecycleError> {
        Container::exec_sh(self, cmd).await
    }
}

/// A container as it appears in a listing.
pub struct LightContainer<E: Engine> {
    engine: Arc<E>,
    id: ContainerId,
    name: String,
    image: String,
    state: String,
    status: String,
}

impl<E: Engine> LightContainer<E> {
    pub fn from_summary(engine: Arc<E>, summary: ContainerSummary) -> Self {
        Self {
            engine,
            id: summary.id,
            name: summary.name.trim_start_matches('/').to_string(),
            image: summary.image,
            state: summary.state,
            status: summary.status,
        }
    }

    pub fn container_id(&self) -> &ContainerId {
        &self.id
    }

    /// Engine state string (`running`, `exited`, ...).
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Human-readable status (`Up 3 minutes`).
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Inspect the container and return a full handle for it.
    pub async fn promote(&self) -> Result<Container<E>, LifecycleError> {
        inspect(&self.engine, &self.id).await
    }
}

#[async_trait]
impl<E: Engine> ContainerView for LightContainer<E> {
    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn short_id(&self) -> &str {
        self.id.short()
    }

    fn image(&self) -> &str {
        &self.image
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn is_running(&self) -> Result<bool, LifecycleError> {
        Ok(self.promote().await?.is_running())
    }

    async fn exec_sh(&self, cmd: &str) -> Result<Vec<String>, LifecycleError> {
        self.promote().await?.exec_sh(cmd).await
    }
}

impl<E: Engine> std::fmt::Debug for LightContainer<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LightContainer")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("image", &self.image)
            .field("state", &self.state)
            .finish()
    }
}

/// Every container on the engine, running or not.
pub async fn list_containers<E: Engine>(
    engine: &Arc<E>,
) -> Result<Vec<LightContainer<E>>, LifecycleError> {
    list_with(engine, &ContainerFilters::all()).await
}

pub async fn list_running_containers<E: Engine>(
    engine: &Arc<E>,
) -> Result<Vec<LightContainer<E>>, LifecycleError> {
    list_with(engine, &ContainerFilters::running()).await
}

async fn list_with<E: Engine>(
    engine: &Arc<E>,
    filters: &ContainerFilters,
) -> Result<Vec<LightContainer<E>>, LifecycleError> {
    let summaries = engine.list_containers(filters).await.context(ListSnafu)?;
    Ok(summaries
        .into_iter()
        .map(|s| LightContainer::from_summary(Arc::clone(engine), s))
        .collect())
}

/// Inspect a container by id or name and return a bound handle.
pub async fn inspect<E: Engine>(
    engine: &Arc<E>,
    id: &ContainerId,
) -> Result<Container<E>, LifecycleError> {
    let snapshot = engine
        .inspect_container(id)
        .await
        .context(RefreshSnafu { short_id: id.short() })?;
    Ok(Container::from_snapshot(Arc::clone(engine), snapshot))
}

pub fn container_ids<E: Engine>(containers: &[LightContainer<E>]) -> Vec<ContainerId> {
    containers.iter().map(|c| c.id.clone()).collect()
}
