// ABOUTME: Bollard-based engine gateway implementation.
// ABOUTME: Talks the Docker-compatible API, so it serves both Docker and Podman.

use crate::engine::traits::{
    ContainerConfig, ContainerError, ContainerFilters, ContainerOps, ContainerSnapshot,
    ContainerState, ContainerSummary, CreateRequest, EngineInfo, EngineInfoError, EngineMetadata,
    ExecConfig, ExecError, ExecInfo, ExecOps, ExecOutput, ExecStarted, HostBinding, HostConfig,
    ImageError, ImageOps, LogError, LogLine, LogOps, LogOptions, LogSource, LogStream, PortMap,
    PullProgress, PullProgressSink, RemoveOptions,
};
use crate::engine::types::{EngineEndpoint, EngineType};
use crate::types::{ContainerId, ExecId, ImageRef};
use async_trait::async_trait;
use bollard::Docker;
use bollard::container::LogOutput;
use bollard::exec::{StartExecOptions, StartExecResults};
use bollard::models;
use bollard::query_parameters::{
    CreateContainerOptions, CreateImageOptions, InspectContainerOptions, ListContainersOptions,
    LogsOptions, RemoveContainerOptions, RemoveImageOptions, RenameContainerOptions,
    StartContainerOptions, StopContainerOptions,
};
use futures::StreamExt;
use hyper_util::rt::TokioIo;
use std::collections::HashMap;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;

// =============================================================================
// Error Mapping Helpers
// =============================================================================

fn status_of(e: &bollard::errors::Error) -> Option<(u16, &str)> {
    match e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } => Some((*status_code, message.as_str())),
        _ => None,
    }
}

fn map_image_remove_error(e: bollard::errors::Error, image_name: &str) -> ImageError {
    match status_of(&e) {
        Some((404, _)) => ImageError::NotFound(image_name.to_string()),
        Some((409, message)) => ImageError::InUse(message.to_string()),
        _ => ImageError::Engine(format!("failed to remove {image_name}: {e}")),
    }
}

fn map_container_create_error(e: bollard::errors::Error) -> ContainerError {
    match status_of(&e) {
        Some((404, message)) => ContainerError::ImageNotFound(message.to_string()),
        Some((409, message)) => ContainerError::AlreadyExists(message.to_string()),
        _ => ContainerError::Engine(e.to_string()),
    }
}

fn map_container_start_error(e: bollard::errors::Error) -> ContainerError {
    match status_of(&e) {
        Some((404, message)) => ContainerError::NotFound(message.to_string()),
        Some((304, message)) => ContainerError::AlreadyRunning(message.to_string()),
        _ => ContainerError::Engine(e.to_string()),
    }
}

fn map_container_stop_error(e: bollard::errors::Error) -> ContainerError {
    match status_of(&e) {
        Some((404, message)) => ContainerError::NotFound(message.to_string()),
        Some((304, message)) => ContainerError::NotRunning(message.to_string()),
        _ => ContainerError::Engine(e.to_string()),
    }
}

fn map_container_error(e: bollard::errors::Error) -> ContainerError {
    match status_of(&e) {
        Some((404, message)) => ContainerError::NotFound(message.to_string()),
        Some((409, message)) => ContainerError::Conflict(message.to_string()),
        _ => ContainerError::Engine(e.to_string()),
    }
}

fn map_exec_create_error(e: bollard::errors::Error) -> ExecError {
    match status_of(&e) {
        Some((404, message)) => ExecError::ContainerNotFound(message.to_string()),
        Some((409, message)) => ExecError::ContainerNotRunning(message.to_string()),
        _ => ExecError::Engine(e.to_string()),
    }
}

fn map_exec_not_found_error(e: bollard::errors::Error) -> ExecError {
    match status_of(&e) {
        Some((404, message)) => ExecError::ExecNotFound(message.to_string()),
        _ => ExecError::Engine(e.to_string()),
    }
}

fn map_log_error(e: bollard::errors::Error) -> LogError {
    match status_of(&e) {
        Some((404, message)) => LogError::ContainerNotFound(message.to_string()),
        _ => LogError::Stream(e.to_string()),
    }
}

// =============================================================================
// Model Conversion Helpers
// =============================================================================

fn to_engine_port_map(ports: &PortMap) -> HashMap<String, Option<Vec<models::PortBinding>>> {
    ports
        .iter()
        .map(|(key, bindings)| {
            let bindings = bindings
                .iter()
                .map(|b| models::PortBinding {
                    host_ip: Some(b.host_ip.clone()),
                    host_port: Some(b.host_port.clone()),
                })
                .collect();
            (key.clone(), Some(bindings))
        })
        .collect()
}

fn from_engine_port_map(ports: Option<HashMap<String, Option<Vec<models::PortBinding>>>>) -> PortMap {
    ports
        .unwrap_or_default()
        .into_iter()
        .map(|(key, bindings)| {
            let bindings = bindings
                .unwrap_or_default()
                .into_iter()
                .map(|b| HostBinding {
                    host_ip: b.host_ip.unwrap_or_default(),
                    host_port: b.host_port.unwrap_or_default(),
                })
                .collect();
            (key, bindings)
        })
        .collect()
}

fn non_empty<T>(items: &[T]) -> Option<Vec<T>>
where
    T: Clone,
{
    if items.is_empty() {
        None
    } else {
        Some(items.to_vec())
    }
}

/// Byte counts of a pull step as `current/total`, or just `current`.
fn progress_text(detail: &models::ProgressDetail) -> Option<String> {
    match (detail.current, detail.total) {
        (Some(current), Some(total)) if total > 0 => Some(format!("{current}/{total}")),
        (Some(current), _) => Some(current.to_string()),
        _ => None,
    }
}

fn snapshot_from_inspect(details: models::ContainerInspectResponse) -> ContainerSnapshot {
    let state = details
        .state
        .as_ref()
        .and_then(|s| s.status)
        .map(|s| match s {
            models::ContainerStateStatusEnum::CREATED => ContainerState::Created,
            models::ContainerStateStatusEnum::RUNNING => ContainerState::Running,
            models::ContainerStateStatusEnum::PAUSED => ContainerState::Paused,
            models::ContainerStateStatusEnum::RESTARTING => ContainerState::Restarting,
            models::ContainerStateStatusEnum::REMOVING => ContainerState::Removing,
            models::ContainerStateStatusEnum::DEAD => ContainerState::Dead,
            _ => ContainerState::Exited,
        })
        .unwrap_or(ContainerState::Exited);
    let running = details
        .state
        .as_ref()
        .and_then(|s| s.running)
        .unwrap_or(state == ContainerState::Running);

    // Every exposed port appears as a key here, published or not.
    let ports = from_engine_port_map(details.network_settings.and_then(|n| n.ports));

    let config = details.config.unwrap_or_default();
    let host = details.host_config.unwrap_or_default();

    ContainerSnapshot {
        id: ContainerId::new(details.id.unwrap_or_default()),
        name: details
            .name
            .unwrap_or_default()
            .trim_start_matches('/')
            .to_string(),
        image: config.image.clone().unwrap_or_default(),
        state,
        running,
        config: ContainerConfig {
            image: config.image.unwrap_or_default(),
            cmd: config.cmd.unwrap_or_default(),
            env: config.env.unwrap_or_default(),
            hostname: config.hostname,
            exposed_ports: ports.keys().cloned().collect(),
        },
        host_config: HostConfig {
            port_bindings: from_engine_port_map(host.port_bindings),
            binds: host.binds.unwrap_or_default(),
            links: host.links.unwrap_or_default(),
            memory: host.memory,
            memory_swap: host.memory_swap,
            cpu_shares: host.cpu_shares,
            cpuset_cpus: host.cpuset_cpus,
        },
        ports,
    }
}

fn summary_from_listing(c: models::ContainerSummary) -> ContainerSummary {
    let name = c
        .names
        .unwrap_or_default()
        .first()
        .map(|n| n.trim_start_matches('/').to_string())
        .unwrap_or_default();

    ContainerSummary {
        id: ContainerId::new(c.id.unwrap_or_default()),
        name,
        image: c.image.unwrap_or_default(),
        state: c
            .state
            .map(|s| format!("{s:?}").to_lowercase())
            .unwrap_or_default(),
        status: c.status.unwrap_or_default(),
        labels: c.labels.unwrap_or_default(),
        created: c
            .created
            .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0)),
    }
}

// =============================================================================
// BollardEngine
// =============================================================================

/// Engine gateway backed by bollard.
///
/// Serves both Docker and Podman through the Docker-compatible API. For
/// Podman, image pulls go through the native libpod endpoint so insecure
/// (plain HTTP) registries work.
pub struct BollardEngine {
    client: Docker,
    engine_type: EngineType,
    socket_path: Option<String>,
}

impl BollardEngine {
    /// Wrap an existing bollard client.
    pub fn new(client: Docker, engine_type: EngineType) -> Self {
        Self {
            client,
            engine_type,
            socket_path: None,
        }
    }

    /// Connect to the unix socket of a detected or configured endpoint.
    pub fn connect(endpoint: &EngineEndpoint, timeout: Duration) -> Result<Self, EngineInfoError> {
        let client = Docker::connect_with_unix(
            &endpoint.socket_path,
            timeout.as_secs(),
            bollard::API_DEFAULT_VERSION,
        )
        .map_err(|e| EngineInfoError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            engine_type: endpoint.engine_type,
            socket_path: Some(endpoint.socket_path.clone()),
        })
    }

    pub fn engine_type(&self) -> EngineType {
        self.engine_type
    }

    /// Pull through Podman's libpod API with `tlsVerify=false`.
    ///
    /// The response body is a sequence of JSON objects; `stream` entries are
    /// forwarded as progress and an `error` entry fails the pull.
    async fn pull_image_libpod(
        &self,
        socket_path: &str,
        image_name: &str,
        progress: Option<&PullProgressSink>,
    ) -> Result<(), ImageError> {
        use http_body_util::BodyExt;

        let pull_failed = |what: &str, e: &dyn std::fmt::Display| {
            ImageError::PullFailed(format!("{image_name}: {what}: {e}"))
        };

        let stream = UnixStream::connect(socket_path)
            .await
            .map_err(|e| pull_failed("socket connect failed", &e))?;

        let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
            .await
            .map_err(|e| pull_failed("HTTP handshake failed", &e))?;

        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::warn!("libpod connection error: {}", e);
            }
        });

        let uri = format!(
            "/v4.0.0/libpod/images/pull?reference={}&tlsVerify=false",
            urlencoding::encode(image_name)
        );
        let request = hyper::Request::builder()
            .method("POST")
            .uri(&uri)
            .header("Host", "localhost")
            .body(http_body_util::Empty::<bytes::Bytes>::new())
            .map_err(|e| pull_failed("invalid request", &e))?;

        let response = sender
            .send_request(request)
            .await
            .map_err(|e| pull_failed("request failed", &e))?;
        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| pull_failed("failed to read response", &e))?
            .to_bytes();

        if !status.is_success() {
            return Err(ImageError::PullFailed(format!(
                "{image_name}: libpod API error: {}",
                String::from_utf8_lossy(&body)
            )));
        }

        for event in serde_json::Deserializer::from_slice(&body).into_iter::<serde_json::Value>() {
            let event = event.map_err(|e| pull_failed("malformed progress", &e))?;
            if let Some(error) = event.get("error").and_then(|e| e.as_str()) {
                return Err(ImageError::PullFailed(format!("{image_name}: {error}")));
            }
            if let (Some(sink), Some(line)) =
                (progress, event.get("stream").and_then(|s| s.as_str()))
            {
                let _ = sink.send(PullProgress {
                    layer: None,
                    status: line.trim_end().to_string(),
                    progress: None,
                });
            }
        }

        Ok(())
    }
}

#[async_trait]
impl EngineInfo for BollardEngine {
    async fn info(&self) -> Result<EngineMetadata, EngineInfoError> {
        let info = self
            .client
            .info()
            .await
            .map_err(|e| EngineInfoError::ConnectionFailed(e.to_string()))?;

        let name = match self.engine_type {
            EngineType::Docker => "Docker",
            EngineType::Podman => "Podman",
        };

        Ok(EngineMetadata {
            name: name.to_string(),
            version: info.server_version.unwrap_or_default(),
            api_version: bollard::API_DEFAULT_VERSION.to_string(),
            os: info.operating_system.unwrap_or_default(),
            arch: info.architecture.unwrap_or_default(),
        })
    }

    async fn ping(&self) -> Result<(), EngineInfoError> {
        self.client
            .ping()
            .await
            .map_err(|e| EngineInfoError::ConnectionFailed(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ImageOps for BollardEngine {
    async fn pull_image(
        &self,
        reference: &ImageRef,
        progress: Option<&PullProgressSink>,
    ) -> Result<(), ImageError> {
        let image_name = reference.to_string();

        if self.engine_type == EngineType::Podman
            && let Some(socket_path) = &self.socket_path
        {
            return self
                .pull_image_libpod(socket_path, &image_name, progress)
                .await;
        }

        let opts = CreateImageOptions {
            from_image: Some(image_name.clone()),
            ..Default::default()
        };

        let mut stream = self.client.create_image(Some(opts), None, None);
        while let Some(item) = stream.next().await {
            let info = item.map_err(|e| ImageError::PullFailed(format!("{image_name}: {e}")))?;
            if let (Some(sink), Some(status)) = (progress, info.status) {
                let _ = sink.send(PullProgress {
                    layer: info.id,
                    status,
                    progress: info.progress_detail.as_ref().and_then(progress_text),
                });
            }
        }

        Ok(())
    }

    async fn image_exists(&self, reference: &ImageRef) -> Result<bool, ImageError> {
        let image_name = reference.to_string();

        match self.client.inspect_image(&image_name).await {
            Ok(_) => Ok(true),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(false),
            Err(e) => Err(ImageError::Engine(format!(
                "failed to inspect {image_name}: {e}"
            ))),
        }
    }

    async fn remove_image(&self, reference: &ImageRef, force: bool) -> Result<(), ImageError> {
        let image_name = reference.to_string();

        let opts = RemoveImageOptions {
            force,
            ..Default::default()
        };

        self.client
            .remove_image(&image_name, Some(opts), None)
            .await
            .map_err(|e| map_image_remove_error(e, &image_name))?;

        Ok(())
    }
}

#[async_trait]
impl ContainerOps for BollardEngine {
    async fn create_container(
        &self,
        request: &CreateRequest,
    ) -> Result<ContainerSnapshot, ContainerError> {
        let config = &request.config;
        let host = &request.host_config;

        let host_config = models::HostConfig {
            port_bindings: if host.port_bindings.is_empty() {
                None
            } else {
                Some(to_engine_port_map(&host.port_bindings))
            },
            binds: non_empty(&host.binds),
            links: non_empty(&host.links),
            memory: host.memory,
            memory_swap: host.memory_swap,
            cpu_shares: host.cpu_shares,
            cpuset_cpus: host.cpuset_cpus.clone(),
            ..Default::default()
        };

        let body = models::ContainerCreateBody {
            image: Some(config.image.clone()),
            cmd: non_empty(&config.cmd),
            env: non_empty(&config.env),
            hostname: config.hostname.clone(),
            exposed_ports: non_empty(&config.exposed_ports),
            host_config: Some(host_config),
            ..Default::default()
        };

        let opts = CreateContainerOptions {
            name: Some(request.name.clone()),
            ..Default::default()
        };

        let response = self
            .client
            .create_container(Some(opts), body)
            .await
            .map_err(map_container_create_error)?;

        // The create call only returns the ID; the snapshot comes from inspect.
        self.inspect_container(&ContainerId::new(response.id)).await
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        self.client
            .start_container(id.as_str(), None::<StartContainerOptions>)
            .await
            .map_err(map_container_start_error)
    }

    async fn stop_container(
        &self,
        id: &ContainerId,
        grace: Duration,
    ) -> Result<(), ContainerError> {
        let opts = StopContainerOptions {
            t: Some(grace.as_secs() as i32),
            signal: None,
        };

        self.client
            .stop_container(id.as_str(), Some(opts))
            .await
            .map_err(map_container_stop_error)
    }

    async fn remove_container(
        &self,
        id: &ContainerId,
        options: RemoveOptions,
    ) -> Result<(), ContainerError> {
        let opts = RemoveContainerOptions {
            force: options.force,
            v: options.volumes,
            ..Default::default()
        };

        self.client
            .remove_container(id.as_str(), Some(opts))
            .await
            .map_err(map_container_error)
    }

    async fn inspect_container(
        &self,
        id: &ContainerId,
    ) -> Result<ContainerSnapshot, ContainerError> {
        let details = self
            .client
            .inspect_container(id.as_str(), None::<InspectContainerOptions>)
            .await
            .map_err(map_container_error)?;

        Ok(snapshot_from_inspect(details))
    }

    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        let mut filter_map: HashMap<String, Vec<String>> = HashMap::new();
        if let Some(name) = &filters.name {
            filter_map.insert("name".to_string(), vec![name.clone()]);
        }
        for (key, value) in &filters.labels {
            filter_map
                .entry("label".to_string())
                .or_default()
                .push(format!("{key}={value}"));
        }

        let opts = ListContainersOptions {
            all: filters.all,
            filters: Some(filter_map),
            ..Default::default()
        };

        // Podman reports transient "stopping"/"stopped" states that bollard
        // cannot deserialize; retry a couple of times before giving up.
        let mut attempt = 0;
        loop {
            match self.client.list_containers(Some(opts.clone())).await {
                Ok(containers) => {
                    return Ok(containers.into_iter().map(summary_from_listing).collect());
                }
                Err(e) => {
                    let message = e.to_string();
                    let transient = message.contains("unknown variant `stopping`")
                        || message.contains("unknown variant `stopped`");
                    if !transient || attempt >= 2 {
                        return Err(ContainerError::Engine(message));
                    }
                    attempt += 1;
                    tokio::time::sleep(Duration::from_millis(500)).await;
                }
            }
        }
    }

    async fn rename_container(
        &self,
        id: &ContainerId,
        new_name: &str,
    ) -> Result<(), ContainerError> {
        self.client
            .rename_container(
                id.as_str(),
                RenameContainerOptions {
                    name: new_name.to_string(),
                },
            )
            .await
            .map_err(map_container_error)
    }
}

#[async_trait]
impl ExecOps for BollardEngine {
    async fn exec_create(
        &self,
        container: &ContainerId,
        config: &ExecConfig,
    ) -> Result<ExecId, ExecError> {
        let opts = models::ExecConfig {
            cmd: Some(config.cmd.clone()),
            env: non_empty(&config.env),
            working_dir: config.working_dir.clone(),
            user: config.user.clone(),
            attach_stdin: Some(config.attach_stdin),
            attach_stdout: Some(config.attach_stdout),
            attach_stderr: Some(config.attach_stderr),
            tty: Some(config.tty),
            privileged: Some(config.privileged),
            ..Default::default()
        };

        let response = self
            .client
            .create_exec(container.as_str(), opts)
            .await
            .map_err(map_exec_create_error)?;

        Ok(ExecId::new(response.id))
    }

    /// Attached exec; returns when the engine closes the output stream.
    ///
    /// A Podman build that keeps the stream open past process exit makes this
    /// wait forever. Bound it with `tokio::time::timeout` where that matters.
    async fn exec_start(
        &self,
        exec_id: &ExecId,
        mut output: ExecOutput,
        started: ExecStarted,
    ) -> Result<(), ExecError> {
        let opts = StartExecOptions {
            detach: false,
            ..Default::default()
        };

        let results = self
            .client
            .start_exec(exec_id.as_str(), Some(opts))
            .await
            .map_err(map_exec_not_found_error)?;

        let StartExecResults::Attached {
            output: mut stream, ..
        } = results
        else {
            return Err(ExecError::Stream(format!(
                "exec {exec_id} started detached, no output to capture"
            )));
        };

        // The waiter may already be gone; the output still has to be copied.
        let _ = started.send(());

        while let Some(chunk) = stream.next().await {
            let message = match chunk.map_err(|e| ExecError::Stream(e.to_string()))? {
                LogOutput::StdOut { message }
                | LogOutput::StdErr { message }
                | LogOutput::Console { message } => message,
                LogOutput::StdIn { .. } => continue,
            };
            output
                .write_all(&message)
                .await
                .map_err(|e| ExecError::Stream(e.to_string()))?;
        }

        output
            .shutdown()
            .await
            .map_err(|e| ExecError::Stream(e.to_string()))
    }

    async fn exec_inspect(&self, exec_id: &ExecId) -> Result<ExecInfo, ExecError> {
        let details = self
            .client
            .inspect_exec(exec_id.as_str())
            .await
            .map_err(map_exec_not_found_error)?;

        Ok(ExecInfo {
            id: exec_id.clone(),
            running: details.running.unwrap_or(false),
            exit_code: details.exit_code,
            container_id: ContainerId::new(details.container_id.unwrap_or_default()),
        })
    }
}

#[async_trait]
impl LogOps for BollardEngine {
    async fn container_logs(
        &self,
        id: &ContainerId,
        opts: &LogOptions,
    ) -> Result<LogStream, LogError> {
        let log_opts = LogsOptions {
            stdout: opts.stdout,
            stderr: opts.stderr,
            follow: opts.follow,
            timestamps: opts.timestamps,
            tail: opts.tail_spec(),
            ..Default::default()
        };

        let stream = self.client.logs(id.as_str(), Some(log_opts)).map(|item| {
            let (source, data) = match item.map_err(map_log_error)? {
                LogOutput::StdErr { message } => (LogSource::Stderr, message),
                LogOutput::StdOut { message }
                | LogOutput::StdIn { message }
                | LogOutput::Console { message } => (LogSource::Stdout, message),
            };
            Ok(LogLine {
                content: String::from_utf8_lossy(&data)
                    .trim_end_matches(['\n', '\r'])
                    .to_string(),
                source,
            })
        });

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_text_formats_byte_counts() {
        let detail = models::ProgressDetail {
            current: Some(512),
            total: Some(2048),
        };
        assert_eq!(progress_text(&detail).as_deref(), Some("512/2048"));
    }

    #[test]
    fn progress_text_without_total_shows_current() {
        let detail = models::ProgressDetail {
            current: Some(512),
            total: None,
        };
        assert_eq!(progress_text(&detail).as_deref(), Some("512"));
    }

    #[test]
    fn progress_text_is_empty_without_counts() {
        assert!(progress_text(&models::ProgressDetail::default()).is_none());
    }
}
