// ABOUTME: Desired configuration of a container before it exists on the engine.
// ABOUTME: Validates and normalizes input, then builds the engine create request.

use crate::engine::traits::{ContainerConfig, CreateRequest, HostBinding, HostConfig, PortMap};
use crate::types::{PortBinding, normalize_bind};

use super::error::LifecycleError;

/// Resource limits applied at create time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceLimits {
    /// Memory limit in bytes.
    pub memory: Option<i64>,
    /// Memory plus swap limit in bytes.
    pub memory_swap: Option<i64>,
    /// Relative CPU weight.
    pub cpu_shares: Option<i64>,
    /// CPUs the container may run on (`0-3`, `0,1`).
    pub cpuset: Option<String>,
}

/// Desired container configuration.
///
/// Plain values only, so `clone()` is a full deep copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerOptions {
    pub image: String,
    pub name: String,
    /// Command override; empty keeps the image default.
    pub command: Vec<String>,
    /// Environment in `KEY=value` form.
    pub env: Vec<String>,
    pub hostname: Option<String>,
    pub port_bindings: Vec<PortBinding>,
    /// Bind mounts in `external:internal[:mode]` form.
    pub binds: Vec<String>,
    /// Legacy links in `name:alias` form.
    pub links: Vec<String>,
    pub resources: ResourceLimits,
}

impl ContainerOptions {
    pub fn new(image: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn command<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.push(format!("{key}={value}"));
        self
    }

    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    pub fn port(mut self, binding: PortBinding) -> Self {
        self.port_bindings.push(binding);
        self
    }

    pub fn bind(mut self, spec: impl Into<String>) -> Self {
        self.binds.push(spec.into());
        self
    }

    pub fn link(mut self, spec: impl Into<String>) -> Self {
        self.links.push(spec.into());
        self
    }

    pub fn resources(mut self, resources: ResourceLimits) -> Self {
        self.resources = resources;
        self
    }

    /// Check the fields the engine cannot do without.
    pub fn validate(&self) -> Result<(), LifecycleError> {
        if self.image.trim().is_empty() {
            return Err(LifecycleError::Configuration {
                reason: "image must not be empty".to_string(),
            });
        }
        if self.name.trim_start_matches('/').is_empty() {
            return Err(LifecycleError::Configuration {
                reason: "name must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Strip the leading `/` from the name and fill in default bind modes.
    pub(crate) fn normalize(mut self) -> Self {
        self.name = self.name.trim_start_matches('/').to_string();
        self.binds = self.binds.iter().map(|b| normalize_bind(b)).collect();
        self
    }

    /// Exposed port keys, one per distinct `port/proto`.
    pub fn exposed_ports(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for binding in &self.port_bindings {
            let key = binding.port_key();
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }

    /// Port key to host bindings, as the engine expects them.
    ///
    /// Bindings without a host port get an empty one, which lets the engine
    /// pick a free port.
    pub fn port_map(&self) -> PortMap {
        let mut map = PortMap::new();
        for binding in &self.port_bindings {
            map.entry(binding.port_key()).or_default().push(HostBinding {
                host_ip: binding.host_ip().to_string(),
                host_port: binding
                    .host_port
                    .map(|p| p.to_string())
                    .unwrap_or_default(),
            });
        }
        map
    }

    pub fn to_create_request(&self) -> CreateRequest {
        CreateRequest {
            name: self.name.clone(),
            config: ContainerConfig {
                image: self.image.clone(),
                cmd: self.command.clone(),
                env: self.env.clone(),
                hostname: self.hostname.clone(),
                exposed_ports: self.exposed_ports(),
            },
            host_config: HostConfig {
                port_bindings: self.port_map(),
                binds: self.binds.clone(),
                links: self.links.clone(),
                memory: self.resources.memory,
                memory_swap: self.resources.memory_swap,
                cpu_shares: self.resources.cpu_shares,
                cpuset_cpus: self.resources.cpuset.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_port_on_two_protocols_gets_two_keys() {
        let opts = ContainerOptions::new("dns:latest", "dns")
            .port(PortBinding::new(53, 5353))
            .port(PortBinding::new(53, 5353).udp());
        assert_eq!(opts.exposed_ports(), vec!["53/tcp", "53/udp"]);
    }

    #[test]
    fn unpublished_port_leaves_host_port_empty() {
        let opts = ContainerOptions::new("web:latest", "web").port("8080".parse().unwrap());
        let map = opts.port_map();
        assert_eq!(map["8080/tcp"][0].host_port, "");
        assert_eq!(map["8080/tcp"][0].host_ip, "0.0.0.0");
    }

    #[test]
    fn normalize_strips_slash_and_fills_bind_mode() {
        let opts = ContainerOptions::new("redis", "/cache")
            .bind("/srv:/data")
            .normalize();
        assert_eq!(opts.name, "cache");
        assert_eq!(opts.binds, vec!["/srv:/data:rw"]);
    }

    #[test]
    fn slash_only_name_is_rejected() {
        let opts = ContainerOptions::new("redis", "/");
        assert!(opts.validate().is_err());
    }
}
