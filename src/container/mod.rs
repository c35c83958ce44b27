// ABOUTME: Container lifecycle: handles, command execution, pools and light views.
// ABOUTME: Everything here talks to the engine only through the gateway traits.

mod error;
mod exec;
mod handle;
mod light;
mod options;
mod pool;

pub use error::{LifecycleError, LifecycleErrorKind};
pub use exec::SHELL;
pub use handle::{Container, STOP_GRACE_PERIOD};
pub use light::{
    ContainerView, LightContainer, container_ids, inspect, list_containers,
    list_running_containers,
};
pub use options::{ContainerOptions, ResourceLimits};
pub use pool::{MemberOutcome, Pool, PoolReport};
