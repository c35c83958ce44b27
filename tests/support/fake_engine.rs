// ABOUTME: In-memory engine gateway that records every call.
// ABOUTME: Failures are switched on per test through FakeState.

use async_trait::async_trait;
use dockyard::engine::traits::*;
use dockyard::types::{ContainerId, ExecId, ImageRef};
use futures::stream;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// One recorded gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ImageExists(String),
    Pull(String),
    Create(String),
    Start(String),
    Stop(String, Duration),
    Remove {
        target: String,
        force: bool,
        volumes: bool,
    },
    Inspect(String),
    List { all: bool },
    Rename(String, String),
    ExecCreate(String, Vec<String>),
    ExecStart(String),
    ExecInspect(String),
    Logs(String),
}

/// Knobs and bookkeeping for [`FakeEngine`].
#[derive(Default)]
pub struct FakeState {
    pub calls: Vec<Call>,
    pub image_present: bool,
    pub fail_pull: bool,
    /// Container names whose create fails.
    pub fail_create: HashSet<String>,
    /// Container names whose create panics.
    pub panic_on_create: HashSet<String>,
    pub fail_start: bool,
    pub fail_stop: bool,
    /// Every inspect fails with an engine error.
    pub fail_inspect: bool,
    /// Non-forced removes fail.
    pub fail_graceful_remove: bool,
    /// Every remove addressed by engine id fails.
    pub fail_remove_by_id: bool,
    /// Every remove fails.
    pub fail_remove: bool,
    pub fail_exec_start: bool,
    /// exec_start returns without ever signalling that it attached.
    pub exec_never_attaches: bool,
    /// exec_start writes its output but never closes the stream.
    pub exec_never_closes: bool,
    pub exec_output: Vec<u8>,
    pub exec_exit_code: Option<i64>,
    pub log_lines: Vec<String>,
    pub containers: HashMap<String, ContainerSnapshot>,
    next_id: u64,
}

#[derive(Default)]
pub struct FakeEngine {
    state: Mutex<FakeState>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn configure(&self, f: impl FnOnce(&mut FakeState)) {
        f(&mut self.state.lock());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn container_count(&self) -> usize {
        self.state.lock().containers.len()
    }

    /// Put a container straight into the engine, as if created elsewhere.
    pub fn seed(&self, name: &str, image: &str, running: bool) -> ContainerId {
        let mut state = self.state.lock();
        let id = state.allocate_id();
        let snapshot = ContainerSnapshot {
            id: id.clone(),
            name: name.to_string(),
            image: image.to_string(),
            state: if running {
                ContainerState::Running
            } else {
                ContainerState::Exited
            },
            running,
            config: ContainerConfig {
                image: image.to_string(),
                ..Default::default()
            },
            host_config: HostConfig::default(),
            ports: PortMap::new(),
        };
        state.containers.insert(id.as_str().to_string(), snapshot);
        id
    }
}

impl FakeState {
    fn allocate_id(&mut self) -> ContainerId {
        self.next_id += 1;
        ContainerId::new(format!("{:06x}{}", 0xabc000 + self.next_id, "f".repeat(58)))
    }

    /// Look a container up by id or by name.
    fn find_key(&self, target: &str) -> Option<String> {
        if self.containers.contains_key(target) {
            return Some(target.to_string());
        }
        self.containers
            .iter()
            .find(|(_, c)| c.name == target)
            .map(|(key, _)| key.clone())
    }
}

#[async_trait]
impl ContainerOps for FakeEngine {
    async fn create_container(
        &self,
        request: &CreateRequest,
    ) -> Result<ContainerSnapshot, ContainerError> {
        let should_panic = {
            let mut state = self.state.lock();
            state.calls.push(Call::Create(request.name.clone()));
            if state.fail_create.contains(&request.name) {
                return Err(ContainerError::AlreadyExists(request.name.clone()));
            }
            state.panic_on_create.contains(&request.name)
        };
        if should_panic {
            panic!("create of {} blew up", request.name);
        }

        let mut state = self.state.lock();
        let id = state.allocate_id();
        let snapshot = ContainerSnapshot {
            id: id.clone(),
            name: request.name.clone(),
            image: request.config.image.clone(),
            state: ContainerState::Created,
            running: false,
            config: request.config.clone(),
            host_config: request.host_config.clone(),
            ports: request.host_config.port_bindings.clone(),
        };
        state
            .containers
            .insert(id.as_str().to_string(), snapshot.clone());
        Ok(snapshot)
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Start(id.to_string()));
        if state.fail_start {
            return Err(ContainerError::Engine("start refused".to_string()));
        }
        let key = state
            .find_key(id.as_str())
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        if let Some(c) = state.containers.get_mut(&key) {
            c.running = true;
            c.state = ContainerState::Running;
        }
        Ok(())
    }

    async fn stop_container(
        &self,
        id: &ContainerId,
        grace: Duration,
    ) -> Result<(), ContainerError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Stop(id.to_string(), grace));
        if state.fail_stop {
            return Err(ContainerError::Engine("stop refused".to_string()));
        }
        let key = state
            .find_key(id.as_str())
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        if let Some(c) = state.containers.get_mut(&key) {
            c.running = false;
            c.state = ContainerState::Exited;
        }
        Ok(())
    }

    async fn remove_container(
        &self,
        id: &ContainerId,
        options: RemoveOptions,
    ) -> Result<(), ContainerError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Remove {
            target: id.to_string(),
            force: options.force,
            volumes: options.volumes,
        });

        let by_id = state.containers.contains_key(id.as_str());
        if state.fail_remove
            || (by_id && state.fail_remove_by_id)
            || (!options.force && state.fail_graceful_remove)
        {
            return Err(ContainerError::Conflict(format!("cannot remove {id}")));
        }

        let key = state
            .find_key(id.as_str())
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        state.containers.remove(&key);
        Ok(())
    }

    async fn inspect_container(
        &self,
        id: &ContainerId,
    ) -> Result<ContainerSnapshot, ContainerError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Inspect(id.to_string()));
        if state.fail_inspect {
            return Err(ContainerError::Engine("inspect refused".to_string()));
        }
        state
            .find_key(id.as_str())
            .and_then(|key| state.containers.get(&key).cloned())
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))
    }

    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        let mut state = self.state.lock();
        state.calls.push(Call::List { all: filters.all });
        let mut summaries: Vec<ContainerSummary> = state
            .containers
            .values()
            .filter(|c| filters.all || c.running)
            .map(|c| ContainerSummary {
                id: c.id.clone(),
                name: format!("/{}", c.name),
                image: c.image.clone(),
                state: c.state.to_string(),
                status: String::new(),
                labels: HashMap::new(),
                created: None,
            })
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(summaries)
    }

    async fn rename_container(
        &self,
        id: &ContainerId,
        new_name: &str,
    ) -> Result<(), ContainerError> {
        let mut state = self.state.lock();
        state
            .calls
            .push(Call::Rename(id.to_string(), new_name.to_string()));
        let key = state
            .find_key(id.as_str())
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        if let Some(c) = state.containers.get_mut(&key) {
            c.name = new_name.to_string();
        }
        Ok(())
    }
}

#[async_trait]
impl ExecOps for FakeEngine {
    async fn exec_create(
        &self,
        container: &ContainerId,
        config: &ExecConfig,
    ) -> Result<ExecId, ExecError> {
        let mut state = self.state.lock();
        state
            .calls
            .push(Call::ExecCreate(container.to_string(), config.cmd.clone()));
        if state.find_key(container.as_str()).is_none() {
            return Err(ExecError::ContainerNotFound(container.to_string()));
        }
        Ok(ExecId::new(format!("exec-{}", state.calls.len())))
    }

    async fn exec_start(
        &self,
        exec_id: &ExecId,
        mut output: ExecOutput,
        started: ExecStarted,
    ) -> Result<(), ExecError> {
        let (fail, never_attaches, never_closes, bytes) = {
            let mut state = self.state.lock();
            state.calls.push(Call::ExecStart(exec_id.to_string()));
            (
                state.fail_exec_start,
                state.exec_never_attaches,
                state.exec_never_closes,
                state.exec_output.clone(),
            )
        };

        if fail {
            return Err(ExecError::ContainerNotRunning("container is stopped".to_string()));
        }
        if never_attaches {
            return Ok(());
        }

        let _ = started.send(());
        // Small chunks so the reader sees lines split across writes.
        for chunk in bytes.chunks(3) {
            output
                .write_all(chunk)
                .await
                .map_err(|e| ExecError::Stream(e.to_string()))?;
        }
        if never_closes {
            std::future::pending::<()>().await;
        }
        output
            .shutdown()
            .await
            .map_err(|e| ExecError::Stream(e.to_string()))
    }

    async fn exec_inspect(&self, exec_id: &ExecId) -> Result<ExecInfo, ExecError> {
        let mut state = self.state.lock();
        state.calls.push(Call::ExecInspect(exec_id.to_string()));
        Ok(ExecInfo {
            id: exec_id.clone(),
            running: false,
            exit_code: state.exec_exit_code,
            container_id: ContainerId::new(""),
        })
    }
}

#[async_trait]
impl ImageOps for FakeEngine {
    async fn pull_image(
        &self,
        reference: &ImageRef,
        progress: Option<&PullProgressSink>,
    ) -> Result<(), ImageError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Pull(reference.to_string()));
        if state.fail_pull {
            return Err(ImageError::PullFailed(reference.to_string()));
        }
        if let Some(sink) = progress {
            let _ = sink.send(PullProgress {
                layer: Some("layer1".to_string()),
                status: "Pull complete".to_string(),
                progress: None,
            });
        }
        state.image_present = true;
        Ok(())
    }

    async fn image_exists(&self, reference: &ImageRef) -> Result<bool, ImageError> {
        let mut state = self.state.lock();
        state.calls.push(Call::ImageExists(reference.to_string()));
        Ok(state.image_present)
    }

    async fn remove_image(&self, _reference: &ImageRef, _force: bool) -> Result<(), ImageError> {
        Ok(())
    }
}

#[async_trait]
impl LogOps for FakeEngine {
    async fn container_logs(
        &self,
        id: &ContainerId,
        opts: &LogOptions,
    ) -> Result<LogStream, LogError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Logs(id.to_string()));
        let lines = state.log_lines.clone();
        let skip = opts
            .tail
            .map(|n| lines.len().saturating_sub(n as usize))
            .unwrap_or(0);
        let items: Vec<Result<LogLine, LogError>> = lines
            .into_iter()
            .skip(skip)
            .map(|content| {
                Ok(LogLine {
                    content,
                    source: LogSource::Stdout,
                })
            })
            .collect();
        Ok(Box::pin(stream::iter(items)))
    }
}

#[async_trait]
impl EngineInfo for FakeEngine {
    async fn info(&self) -> Result<EngineMetadata, EngineInfoError> {
        Ok(EngineMetadata {
            name: "Fake".to_string(),
            version: "1.0".to_string(),
            api_version: "1.44".to_string(),
            os: "linux".to_string(),
            arch: "x86_64".to_string(),
        })
    }

    async fn ping(&self) -> Result<(), EngineInfoError> {
        Ok(())
    }
}
