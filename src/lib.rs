// ABOUTME: Library root for dockyard - container lifecycle control over Docker and Podman.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod container;
pub mod engine;
pub mod error;
pub mod output;
pub mod types;
