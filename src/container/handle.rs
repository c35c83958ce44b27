// ABOUTME: Container handle: desired config, engine identity and last observed state.
// ABOUTME: Create, start, stop, escalating remove, run, refresh, rename and logs.

use std::sync::Arc;
use std::time::Duration;

use snafu::ResultExt;

use crate::engine::Engine;
use crate::engine::traits::{
    ContainerError, ContainerSnapshot, LogOptions, LogStream, PortMap, PullProgressSink,
    RemoveOptions,
};
use crate::types::{ContainerId, DEFAULT_HOST_IP, ImageRef, PortBinding, Protocol};

use super::error::{
    CreateSnafu, DownloadSnafu, LifecycleError, LogsSnafu, RefreshSnafu, RenameSnafu,
    RunCreateSnafu, RunStartSnafu, StartSnafu, StopSnafu,
};
use super::options::{ContainerOptions, ResourceLimits};

/// Grace period the engine waits before killing a stopping container.
pub const STOP_GRACE_PERIOD: Duration = Duration::from_secs(30);

/// A container on an engine, or one about to be created there.
///
/// The handle starts unbound (no engine id). `create` binds it, `remove`
/// unbinds it again. Every operation other than `create` needs the id and
/// fails with `NotFound` without touching the engine when it is missing.
pub struct Container<E: Engine> {
    engine: Arc<E>,
    options: ContainerOptions,
    id: Option<ContainerId>,
    snapshot: Option<ContainerSnapshot>,
}

impl<E: Engine> Container<E> {
    /// Build an unbound handle from validated options.
    pub fn new(engine: Arc<E>, options: ContainerOptions) -> Result<Self, LifecycleError> {
        options.validate()?;
        Ok(Self {
            engine,
            options: options.normalize(),
            id: None,
            snapshot: None,
        })
    }

    /// Build a bound handle from an engine snapshot, recovering the desired
    /// config from what the engine reports.
    pub fn from_snapshot(engine: Arc<E>, snapshot: ContainerSnapshot) -> Self {
        let host = &snapshot.host_config;
        let options = ContainerOptions {
            image: snapshot.config.image.clone(),
            name: snapshot.name.trim_start_matches('/').to_string(),
            command: snapshot.config.cmd.clone(),
            env: snapshot.config.env.clone(),
            hostname: snapshot.config.hostname.clone(),
            port_bindings: bindings_from_port_map(&host.port_bindings),
            binds: host.binds.clone(),
            links: host.links.clone(),
            resources: ResourceLimits {
                memory: host.memory,
                memory_swap: host.memory_swap,
                cpu_shares: host.cpu_shares,
                cpuset: host.cpuset_cpus.clone(),
            },
        };

        Self {
            engine,
            options,
            id: Some(snapshot.id.clone()),
            snapshot: Some(snapshot),
        }
    }

    pub fn id(&self) -> Option<&ContainerId> {
        self.id.as_ref()
    }

    /// First 12 characters of the id, empty when unbound.
    pub fn short_id(&self) -> &str {
        self.id.as_ref().map(|id| id.short()).unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        &self.options.name
    }

    pub fn image(&self) -> &str {
        &self.options.image
    }

    /// Running flag from the last observed state; false when never observed.
    pub fn is_running(&self) -> bool {
        self.snapshot.as_ref().is_some_and(|s| s.running)
    }

    /// Observed environment, or the desired one before the first observation.
    pub fn envs(&self) -> &[String] {
        match &self.snapshot {
            Some(snapshot) => &snapshot.config.env,
            None => &self.options.env,
        }
    }

    /// Host ports the engine assigned, from the last observed state.
    pub fn ports(&self) -> Option<&PortMap> {
        self.snapshot.as_ref().map(|s| &s.ports)
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.options
    }

    /// Desired config for the next `create`. Edits never reach a container
    /// that already exists on the engine.
    pub fn options_mut(&mut self) -> &mut ContainerOptions {
        &mut self.options
    }

    pub fn snapshot(&self) -> Option<&ContainerSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    pub(crate) fn require_id(&self) -> Result<&ContainerId, LifecycleError> {
        self.id.as_ref().ok_or_else(|| LifecycleError::NotFound {
            name: self.options.name.clone(),
        })
    }

    /// Create the container on the engine and bind this handle to it.
    pub async fn create(&mut self) -> Result<(), LifecycleError> {
        self.options.validate()?;
        self.options = std::mem::take(&mut self.options).normalize();

        let request = self.options.to_create_request();
        let snapshot = self
            .engine
            .create_container(&request)
            .await
            .context(CreateSnafu {
                name: &self.options.name,
            })?;

        self.id = Some(snapshot.id.clone());
        self.snapshot = Some(snapshot);
        Ok(())
    }

    pub async fn start(&mut self) -> Result<(), LifecycleError> {
        let id = self.require_id()?.clone();
        self.engine
            .start_container(&id)
            .await
            .context(StartSnafu { short_id: id.short() })?;
        self.refresh().await
    }

    /// Stop with [`STOP_GRACE_PERIOD`] before the engine kills the process.
    pub async fn stop(&mut self) -> Result<(), LifecycleError> {
        self.stop_on_engine().await?;
        self.refresh().await
    }

    async fn stop_on_engine(&self) -> Result<(), LifecycleError> {
        let id = self.require_id()?;
        self.engine
            .stop_container(id, STOP_GRACE_PERIOD)
            .await
            .context(StopSnafu { short_id: id.short() })
    }

    /// Remove the container, escalating until something works.
    ///
    /// Tries a graceful then a forced remove by id, then the same two steps
    /// by name. Only the last engine error is reported. On success the
    /// handle is unbound.
    pub async fn remove(&mut self, remove_volumes: bool) -> Result<(), LifecycleError> {
        let id = self.require_id()?.clone();

        let mut result = self.remove_escalating(&id, remove_volumes).await;

        if result.is_err() && !self.options.name.is_empty() {
            tracing::debug!(container = %self.options.name, "remove by id failed, retrying by name");
            let by_name = ContainerId::new(self.options.name.clone());
            result = self.remove_escalating(&by_name, remove_volumes).await;
        }

        let Err(last_error) = result else {
            self.unbind();
            return Ok(());
        };

        Err(LifecycleError::Remove {
            name: self.options.name.clone(),
            short_id: id.short().to_string(),
            source: last_error,
        })
    }

    async fn remove_escalating(
        &self,
        target: &ContainerId,
        volumes: bool,
    ) -> Result<(), ContainerError> {
        let graceful = RemoveOptions {
            force: false,
            volumes,
        };
        match self.engine.remove_container(target, graceful).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::debug!(
                    container = %target.short(),
                    error = %e,
                    "graceful remove failed, forcing"
                );
                let forced = RemoveOptions {
                    force: true,
                    volumes,
                };
                self.engine.remove_container(target, forced).await
            }
        }
    }

    fn unbind(&mut self) {
        self.id = None;
        self.snapshot = None;
    }

    /// Stop, then remove. Nothing is removed if the engine refuses the stop.
    ///
    /// The post-stop inspect is skipped: the container is about to go away.
    pub async fn stop_and_remove(&mut self, remove_volumes: bool) -> Result<(), LifecycleError> {
        self.stop_on_engine().await?;
        self.remove(remove_volumes).await
    }

    /// Pull the image if it is missing, then create and start.
    pub async fn run(&mut self) -> Result<(), LifecycleError> {
        self.run_with_progress(None).await
    }

    /// [`run`](Self::run), forwarding image pull progress to `progress`.
    pub async fn run_with_progress(
        &mut self,
        progress: Option<&PullProgressSink>,
    ) -> Result<(), LifecycleError> {
        self.ensure_image(progress).await?;

        tracing::info!(container = %self.options.name, "creating container");
        self.create()
            .await
            .map_err(Box::new)
            .context(RunCreateSnafu {
                name: &self.options.name,
            })?;

        tracing::info!(container = %self.options.name, "starting container");
        self.start()
            .await
            .map_err(Box::new)
            .context(RunStartSnafu {
                name: &self.options.name,
            })?;

        tracing::info!(
            container = %self.options.name,
            id = %self.short_id(),
            "container started"
        );
        Ok(())
    }

    async fn ensure_image(&self, progress: Option<&PullProgressSink>) -> Result<(), LifecycleError> {
        let image = ImageRef::parse(&self.options.image).map_err(|e| {
            LifecycleError::Configuration {
                reason: format!("image {:?}: {e}", self.options.image),
            }
        })?;

        let present = self
            .engine
            .image_exists(&image)
            .await
            .context(DownloadSnafu {
                image: &self.options.image,
            })?;
        if present {
            tracing::debug!(image = %image, "image already present");
            return Ok(());
        }

        tracing::info!(image = %image, "pulling image");
        self.engine
            .pull_image(&image, progress)
            .await
            .context(DownloadSnafu {
                image: &self.options.image,
            })
    }

    /// Replace the observed state with a fresh inspect.
    pub async fn refresh(&mut self) -> Result<(), LifecycleError> {
        let id = self.require_id()?.clone();
        let snapshot = self
            .engine
            .inspect_container(&id)
            .await
            .context(RefreshSnafu { short_id: id.short() })?;
        self.snapshot = Some(snapshot);
        Ok(())
    }

    pub async fn rename(&mut self, new_name: &str) -> Result<(), LifecycleError> {
        let new_name = new_name.trim_start_matches('/');
        if new_name.is_empty() {
            return Err(LifecycleError::Configuration {
                reason: "new name must not be empty".to_string(),
            });
        }
        let id = self.require_id()?.clone();

        self.engine
            .rename_container(&id, new_name)
            .await
            .context(RenameSnafu {
                from: &self.options.name,
                to: new_name,
            })?;

        self.options.name = new_name.to_string();
        self.refresh().await
    }

    /// Stream the container's logs.
    pub async fn logs(&self, opts: &LogOptions) -> Result<LogStream, LifecycleError> {
        let id = self.require_id()?;
        self.engine
            .container_logs(id, opts)
            .await
            .context(LogsSnafu { short_id: id.short() })
    }
}

/// Copies the desired configuration only. The clone is unbound and has no
/// observed state.
impl<E: Engine> Clone for Container<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            options: self.options.clone(),
            id: None,
            snapshot: None,
        }
    }
}

impl<E: Engine> std::fmt::Debug for Container<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("name", &self.options.name)
            .field("image", &self.options.image)
            .field("id", &self.id)
            .field("running", &self.is_running())
            .finish()
    }
}

fn bindings_from_port_map(ports: &PortMap) -> Vec<PortBinding> {
    let mut bindings = Vec::new();
    for (key, hosts) in ports {
        let (port, proto) = key.split_once('/').unwrap_or((key.as_str(), "tcp"));
        let Ok(container_port) = port.parse::<u16>() else {
            continue;
        };
        for host in hosts {
            bindings.push(PortBinding {
                container_port,
                host_port: host.host_port.parse().ok(),
                protocol: Protocol::from_name(proto),
                host_ip: (!host.host_ip.is_empty() && host.host_ip != DEFAULT_HOST_IP)
                    .then(|| host.host_ip.clone()),
            });
        }
    }
    bindings
}
