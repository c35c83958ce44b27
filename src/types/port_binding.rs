// ABOUTME: Container-to-host port bindings and their string syntax.
// ABOUTME: Parses "host:container/proto" and normalizes protocols to tcp or udp.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Host address used when a binding does not name one.
pub const DEFAULT_HOST_IP: &str = "0.0.0.0";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParsePortBindingError {
    #[error("port binding cannot be empty")]
    Empty,

    #[error("invalid port number: {0:?}")]
    InvalidPort(String),

    #[error("invalid port binding: {0:?}")]
    InvalidFormat(String),
}

/// Transport protocol of an exposed port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

impl Protocol {
    /// Lenient parse: anything that is not exactly `udp` means tcp.
    pub fn from_name(name: &str) -> Self {
        if name == "udp" {
            Protocol::Udp
        } else {
            Protocol::Tcp
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Protocol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Protocol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Protocol::from_name).unwrap_or_default())
    }
}

/// Binds a port inside the container to a port on the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortBinding {
    pub container_port: u16,
    #[serde(default)]
    pub host_port: Option<u16>,
    #[serde(default)]
    pub protocol: Protocol,
    #[serde(default)]
    pub host_ip: Option<String>,
}

impl PortBinding {
    pub fn new(container_port: u16, host_port: u16) -> Self {
        Self {
            container_port,
            host_port: Some(host_port),
            protocol: Protocol::Tcp,
            host_ip: None,
        }
    }

    pub fn udp(mut self) -> Self {
        self.protocol = Protocol::Udp;
        self
    }

    /// Engine key for this binding, e.g. `6379/tcp`.
    pub fn port_key(&self) -> String {
        format!("{}/{}", self.container_port, self.protocol)
    }

    pub fn host_ip(&self) -> &str {
        self.host_ip.as_deref().unwrap_or(DEFAULT_HOST_IP)
    }
}

impl FromStr for PortBinding {
    type Err = ParsePortBindingError;

    /// Accepts `container`, `host:container` and `ip:host:container`, each
    /// with an optional `/tcp` or `/udp` suffix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParsePortBindingError::Empty);
        }

        let (ports, protocol) = match s.split_once('/') {
            Some((ports, proto)) => (ports, Protocol::from_name(proto)),
            None => (s, Protocol::Tcp),
        };

        let parts: Vec<&str> = ports.split(':').collect();
        let (host_ip, host_port, container_port) = match parts.as_slice() {
            [container] => (None, None, *container),
            [host, container] => (None, Some(*host), *container),
            // An empty host port (`ip::container`) lets the engine pick one.
            [ip, host, container] if !ip.is_empty() => {
                (Some(*ip), Some(*host).filter(|h| !h.is_empty()), *container)
            }
            _ => return Err(ParsePortBindingError::InvalidFormat(s.to_string())),
        };

        Ok(Self {
            container_port: parse_port(container_port)?,
            host_port: host_port.map(parse_port).transpose()?,
            protocol,
            host_ip: host_ip.map(str::to_string),
        })
    }
}

fn parse_port(raw: &str) -> Result<u16, ParsePortBindingError> {
    raw.parse::<u16>()
        .ok()
        .filter(|port| *port != 0)
        .ok_or_else(|| ParsePortBindingError::InvalidPort(raw.to_string()))
}
