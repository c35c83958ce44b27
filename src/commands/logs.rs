// ABOUTME: Logs command implementation.
// ABOUTME: Streams a container's log lines until the stream ends.

use super::engine_connection::connect_engine;
use dockyard::container::inspect;
use dockyard::engine::EngineConfig;
use dockyard::engine::traits::LogOptions;
use dockyard::error::Result;
use dockyard::output::Output;
use dockyard::types::ContainerId;
use futures::StreamExt;

pub async fn logs(
    engine_config: &EngineConfig,
    name: &str,
    tail: Option<u64>,
    follow: bool,
    output: &Output,
) -> Result<()> {
    let engine = connect_engine(engine_config, output).await?;
    let container = inspect(&engine, &ContainerId::new(name)).await?;

    let opts = LogOptions {
        stdout: true,
        stderr: true,
        follow,
        timestamps: false,
        tail,
    };

    let mut stream = container.logs(&opts).await?;
    while let Some(line) = stream.next().await {
        match line {
            Ok(line) => output.line(&line.content),
            Err(e) => {
                output.warning(&format!("log stream ended: {e}"));
                break;
            }
        }
    }

    Ok(())
}
