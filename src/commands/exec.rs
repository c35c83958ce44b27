// ABOUTME: Exec command implementation.
// ABOUTME: Runs a command inside a named container and prints its output.

use super::engine_connection::connect_engine;
use dockyard::container::{LifecycleError, inspect};
use dockyard::engine::EngineConfig;
use dockyard::error::Result;
use dockyard::output::Output;
use dockyard::types::ContainerId;

/// Execute a command in the named container.
pub async fn exec_command(
    engine_config: &EngineConfig,
    name: &str,
    command: Vec<String>,
    shell: bool,
    output: &Output,
) -> Result<()> {
    let engine = connect_engine(engine_config, output).await?;
    let container = inspect(&engine, &ContainerId::new(name)).await?;

    output.progress(&format!(
        "  → Executing in container {}...",
        container.short_id()
    ));

    let result = if shell {
        container.exec_sh(&command.join(" ")).await
    } else {
        container.exec(&command).await
    };

    match result {
        Ok(lines) => {
            for line in &lines {
                output.line(line);
            }
            Ok(())
        }
        Err(e) => {
            if let LifecycleError::Command { output: lines, .. } = &e {
                for line in lines {
                    output.line(line);
                }
            }
            Err(e.into())
        }
    }
}
