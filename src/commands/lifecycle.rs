// ABOUTME: Up and down commands over the configured containers.
// ABOUTME: Builds a pool from the config and fans run or remove out across it.

use super::engine_connection::connect_engine;
use dockyard::config::Config;
use dockyard::container::{LifecycleError, Pool, PoolReport, inspect};
use dockyard::error::Result;
use dockyard::output::Output;
use dockyard::types::ContainerId;

/// Pull, create and start every configured container.
pub async fn up(config: Config, output: &mut Output) -> Result<()> {
    output.start_timer();
    let engine = connect_engine(&config.engine, output).await?;

    let mut pool = config.to_pool(engine)?;
    output.progress(&format!("  → Starting {} container(s)...", pool.len()));

    let report = pool.run_all().await;
    print_report(&report, "started", output);
    report.into_result()?;

    output.success(&format!("{} container(s) up", pool.len()));
    Ok(())
}

/// Remove every configured container that exists on the engine.
pub async fn down(config: Config, remove_volumes: bool, output: &mut Output) -> Result<()> {
    output.start_timer();
    let engine = connect_engine(&config.engine, output).await?;

    let mut pool = Pool::new(Vec::new());
    for spec in config.containers.iter() {
        match inspect(&engine, &ContainerId::new(spec.name.clone())).await {
            Ok(container) => pool.push(container),
            Err(LifecycleError::Refresh { source, .. }) if source.is_not_found() => {
                output.progress(&format!("  → {} not found, skipping", spec.name));
            }
            Err(e) => return Err(e.into()),
        }
    }

    if pool.is_empty() {
        output.success("nothing to remove");
        return Ok(());
    }

    output.progress(&format!("  → Removing {} container(s)...", pool.len()));
    let report = pool.remove_all(remove_volumes).await;
    print_report(&report, "removed", output);
    let removed = report.outcomes.len();
    report.into_result()?;

    output.success(&format!("{removed} container(s) removed"));
    Ok(())
}

fn print_report(report: &PoolReport, verb: &str, output: &Output) {
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(()) => output.progress(&format!("  ✓ {} {verb}", outcome.name)),
            Err(e) => output.warning(&format!("{}: {e}", outcome.name)),
        }
    }
}
