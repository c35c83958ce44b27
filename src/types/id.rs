// ABOUTME: Phantom-typed identifiers for engine-assigned objects.
// ABOUTME: Keeps container IDs and exec session IDs from being mixed up.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Number of characters shown by `short()`, matching `docker ps`.
pub const SHORT_ID_LEN: usize = 12;

/// Marker types for the phantom parameter. Empty enums cannot be constructed.
pub enum ContainerMarker {}
pub enum ExecMarker {}

/// An identifier handed out by the engine.
///
/// The phantom parameter makes a `ContainerId` and an `ExecId` distinct types
/// even though both are plain strings on the wire. Container IDs double as
/// name references: the engine resolves a container name anywhere it accepts
/// an ID.
#[must_use = "IDs reference engine objects and should not be ignored"]
pub struct Id<T> {
    value: String,
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_inner(self) -> String {
        self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// The first twelve characters, or the whole ID when it is shorter.
    pub fn short(&self) -> &str {
        short_id(&self.value)
    }
}

/// Shorten any ID-like string the way the engine CLI does.
pub fn short_id(value: &str) -> &str {
    match value.char_indices().nth(SHORT_ID_LEN) {
        Some((end, _)) => &value[..end],
        None => value,
    }
}

// T is only a marker, so these impls must not require T: Trait.

impl<T> std::fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Id").field(&self.value).finish()
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> std::fmt::Display for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

pub type ContainerId = Id<ContainerMarker>;
pub type ExecId = Id<ExecMarker>;
