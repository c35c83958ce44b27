// ABOUTME: Read-only commands: container listing and engine information.
// ABOUTME: Prints a table in normal mode and one JSON record per item in JSON mode.

use super::engine_connection::connect_engine;
use dockyard::container::{ContainerView, list_containers, list_running_containers};
use dockyard::engine::EngineConfig;
use dockyard::engine::traits::EngineInfo;
use dockyard::error::Result;
use dockyard::output::{Output, OutputMode};
use serde::Serialize;

#[derive(Serialize)]
struct ContainerRow<'a> {
    id: &'a str,
    name: &'a str,
    image: &'a str,
    state: &'a str,
    status: &'a str,
}

/// List containers on the engine.
pub async fn ps(engine_config: &EngineConfig, all: bool, output: &Output) -> Result<()> {
    let engine = connect_engine(engine_config, output).await?;
    let containers = if all {
        list_containers(&engine).await?
    } else {
        list_running_containers(&engine).await?
    };

    match output.mode() {
        OutputMode::Json => {
            for c in &containers {
                output.record(&ContainerRow {
                    id: ContainerView::id(c),
                    name: c.name(),
                    image: c.image(),
                    state: c.state(),
                    status: c.status(),
                });
            }
        }
        OutputMode::Quiet => {
            for c in &containers {
                output.line(c.short_id());
            }
        }
        OutputMode::Normal => {
            output.line(&format!(
                "{:<14}{:<24}{:<32}{}",
                "CONTAINER ID", "NAME", "IMAGE", "STATE"
            ));
            for c in &containers {
                output.line(&format!(
                    "{:<14}{:<24}{:<32}{}",
                    c.short_id(),
                    c.name(),
                    c.image(),
                    c.state()
                ));
            }
        }
    }

    Ok(())
}

/// Show engine metadata.
pub async fn info(engine_config: &EngineConfig, output: &Output) -> Result<()> {
    let engine = connect_engine(engine_config, output).await?;
    let meta = engine.info().await?;

    if output.mode() == OutputMode::Json {
        output.record(&serde_json::json!({
            "engine": meta.name,
            "version": meta.version,
            "api_version": meta.api_version,
            "os": meta.os,
            "arch": meta.arch,
        }));
        return Ok(());
    }

    output.line(&format!("Engine:      {}", meta.name));
    output.line(&format!("Version:     {}", meta.version));
    output.line(&format!("API version: {}", meta.api_version));
    output.line(&format!("OS/Arch:     {}/{}", meta.os, meta.arch));
    Ok(())
}
