// ABOUTME: Helpers for tests against a local Docker or Podman daemon.
// ABOUTME: Skips when no socket is present and removes leftover test containers on exit.

use dockyard::engine::traits::{ContainerOps, RemoveOptions};
use dockyard::engine::{BollardEngine, DEFAULT_ENGINE_TIMEOUT, detect_local};
use dockyard::types::ContainerId;
use parking_lot::Mutex;
use std::sync::Arc;

/// Names of containers created by the current test binary.
static CREATED: Mutex<Vec<String>> = parking_lot::const_mutex(Vec::new());

/// Remove every container a test registered, even if the test failed.
#[ctor::dtor]
fn cleanup_on_exit() {
    let names = std::mem::take(&mut *CREATED.lock());
    if names.is_empty() {
        return;
    }

    let Ok(rt) = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    else {
        return;
    };
    rt.block_on(async {
        let Some(engine) = local_engine() else {
            return;
        };
        for name in names {
            let _ = engine
                .remove_container(
                    &ContainerId::new(name),
                    RemoveOptions {
                        force: true,
                        volumes: true,
                    },
                )
                .await;
        }
    });
}

/// Connect to the local engine, if there is one.
pub fn local_engine() -> Option<BollardEngine> {
    let endpoint = detect_local().ok()?;
    BollardEngine::connect(&endpoint, DEFAULT_ENGINE_TIMEOUT).ok()
}

pub fn shared_local_engine() -> Option<Arc<BollardEngine>> {
    local_engine().map(Arc::new)
}

/// A container name unique to this process, registered for cleanup.
pub fn unique_name(prefix: &str) -> String {
    let name = format!("dockyard-test-{prefix}-{}", std::process::id());
    CREATED.lock().push(name.clone());
    name
}
