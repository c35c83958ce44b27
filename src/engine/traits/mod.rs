// ABOUTME: Composable capability traits for the container engine gateway.
// ABOUTME: Defines ContainerOps, ExecOps, ImageOps, LogOps, EngineInfo and Engine.

mod container;
mod engine_info;
mod exec;
mod image;
mod logs;
mod shared_types;

pub use container::{ContainerError, ContainerFilters, ContainerOps, ContainerSummary};
pub use engine_info::{EngineInfo, EngineInfoError};
pub use exec::{ExecError, ExecOps};
pub use image::{ImageError, ImageOps};
pub use logs::{LogError, LogLine, LogOps, LogOptions, LogSource, LogStream};
pub use shared_types::*;

/// Every capability a container handle needs from the engine.
///
/// Implemented automatically for any type that implements the individual
/// capability traits, so fakes only implement those.
pub trait Engine: ContainerOps + ExecOps + ImageOps + LogOps + EngineInfo + 'static {}

impl<T> Engine for T where T: ContainerOps + ExecOps + ImageOps + LogOps + EngineInfo + 'static {}
