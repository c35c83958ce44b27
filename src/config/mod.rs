// ABOUTME: Configuration types and parsing for dockyard.yml.
// ABOUTME: Handles YAML parsing, env var interpolation, and building container pools.

mod deserialize;
mod env_value;
mod init;

pub use env_value::{EnvValue, resolve_env_map};
pub use init::init_config;

use crate::container::{Container, ContainerOptions, Pool, ResourceLimits};
use crate::engine::{Engine, EngineConfig};
use crate::error::{Error, Result};
use crate::types::{ImageRef, PortBinding};
use deserialize::{deserialize_containers, deserialize_image_ref, deserialize_ports};
use nonempty::NonEmpty;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;

pub const CONFIG_FILENAME: &str = "dockyard.yml";
pub const CONFIG_FILENAME_ALT: &str = "dockyard.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".dockyard/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(deserialize_with = "deserialize_containers")]
    pub containers: NonEmpty<ContainerSpec>,
}

/// One container entry in the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct ContainerSpec {
    pub name: String,

    #[serde(deserialize_with = "deserialize_image_ref")]
    pub image: ImageRef,

    #[serde(default)]
    pub command: Vec<String>,

    #[serde(default)]
    pub hostname: Option<String>,

    #[serde(default, deserialize_with = "deserialize_ports")]
    pub ports: Vec<PortBinding>,

    #[serde(default)]
    pub volumes: Vec<String>,

    #[serde(default)]
    pub links: Vec<String>,

    #[serde(default)]
    pub env: BTreeMap<String, EnvValue>,

    #[serde(default)]
    pub resources: ResourcesConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourcesConfig {
    /// Memory limit in bytes.
    pub memory: Option<i64>,
    /// Memory plus swap limit in bytes.
    pub memory_swap: Option<i64>,
    pub cpu_shares: Option<i64>,
    /// CPUs the container may use (`0-3`, `0,1`).
    pub cpuset: Option<String>,
}

impl ContainerSpec {
    /// Resolve env references and build the desired container config.
    pub fn to_options(&self) -> Result<ContainerOptions> {
        Ok(ContainerOptions {
            image: self.image.to_string(),
            name: self.name.clone(),
            command: self.command.clone(),
            env: resolve_env_map(&self.env)?,
            hostname: self.hostname.clone(),
            port_bindings: self.ports.clone(),
            binds: self.volumes.clone(),
            links: self.links.clone(),
            resources: ResourceLimits {
                memory: self.resources.memory,
                memory_swap: self.resources.memory_swap,
                cpu_shares: self.resources.cpu_shares,
                cpuset: self.resources.cpuset.clone(),
            },
        })
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for spec in self.containers.iter() {
            let name = spec.name.trim_start_matches('/');
            if name.is_empty() {
                return Err(Error::InvalidConfig(
                    "container name must not be empty".to_string(),
                ));
            }
            if !seen.insert(name) {
                return Err(Error::InvalidConfig(format!(
                    "duplicate container name: {name}"
                )));
            }
        }
        Ok(())
    }

    pub fn container(&self, name: &str) -> Result<&ContainerSpec> {
        self.containers
            .iter()
            .find(|spec| spec.name.trim_start_matches('/') == name)
            .ok_or_else(|| Error::UnknownContainer(name.to_string()))
    }

    /// Build an unbound handle for every configured container, in file order.
    pub fn to_pool<E: Engine>(&self, engine: Arc<E>) -> Result<Pool<E>> {
        let members = self
            .containers
            .iter()
            .map(|spec| Ok(Container::new(Arc::clone(&engine), spec.to_options()?)?))
            .collect::<Result<Vec<_>>>()?;
        Ok(Pool::new(members))
    }

    pub fn template() -> &'static str {
        TEMPLATE
    }
}

const TEMPLATE: &str = r#"# Engine connection (auto-detected when omitted)
# engine:
#   runtime: docker
#   socket: /var/run/docker.sock
#   timeout: 2m

containers:
  - name: cache
    image: redis:7
    command: ["redis-server", "--appendonly", "yes"]
    ports:
      - "16379:6379"
    volumes:
      - ./data/redis:/data
    env:
      REDIS_MODE: primary
      # REDIS_PASSWORD:
      #   env: REDIS_PASSWORD
      #   default: changeme
"#;
