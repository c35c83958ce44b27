// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Handles image refs, port bindings and the container list.

use nonempty::NonEmpty;
use serde::Deserialize;

use super::ContainerSpec;
use crate::types::{ImageRef, PortBinding};

pub fn deserialize_image_ref<'de, D>(deserializer: D) -> Result<ImageRef, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    ImageRef::parse(&s).map_err(serde::de::Error::custom)
}

pub fn deserialize_containers<'de, D>(deserializer: D) -> Result<NonEmpty<ContainerSpec>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<ContainerSpec> = Vec::deserialize(deserializer)?;
    NonEmpty::from_vec(values)
        .ok_or_else(|| serde::de::Error::custom("at least one container is required"))
}

pub fn deserialize_ports<'de, D>(deserializer: D) -> Result<Vec<PortBinding>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<PortEntry> = Vec::deserialize(deserializer)?;
    values
        .into_iter()
        .map(|entry| entry.into_port_binding())
        .collect::<Result<Vec<_>, _>>()
        .map_err(serde::de::Error::custom)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PortEntry {
    Simple(String),
    Number(u16),
    Detailed(PortBinding),
}

impl PortEntry {
    fn into_port_binding(self) -> Result<PortBinding, String> {
        match self {
            PortEntry::Simple(s) => s.parse().map_err(|e| format!("{e}")),
            PortEntry::Number(port) => format!("{port}").parse().map_err(|e| format!("{e}")),
            PortEntry::Detailed(binding) => Ok(binding),
        }
    }
}
