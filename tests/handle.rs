// ABOUTME: Integration tests for the container handle lifecycle against a fake engine.
// ABOUTME: Covers create/start/stop, escalating remove, run, rename and clone.

mod support;

use dockyard::container::{
    Container, ContainerOptions, LifecycleError, LifecycleErrorKind, ResourceLimits,
    STOP_GRACE_PERIOD,
};
use dockyard::engine::traits::HostBinding;
use dockyard::types::PortBinding;
use futures::StreamExt;
use std::sync::Arc;
use support::fake_engine::{Call, FakeEngine};

fn redis_options(name: &str) -> ContainerOptions {
    ContainerOptions::new("redis:latest", name)
        .command(["redis-server", "--appendonly", "yes"])
        .env("MODE", "primary")
        .port(PortBinding::new(6379, 16379))
}

fn handle(engine: &Arc<FakeEngine>, name: &str) -> Container<FakeEngine> {
    Container::new(Arc::clone(engine), redis_options(name)).unwrap()
}

async fn created(engine: &Arc<FakeEngine>, name: &str) -> Container<FakeEngine> {
    let mut c = handle(engine, name);
    c.create().await.unwrap();
    engine.clear_calls();
    c
}

fn is_remove(call: &Call) -> bool {
    matches!(call, Call::Remove { .. })
}

// =============================================================================
// Construction
// =============================================================================

mod construction {
    use super::*;

    #[test]
    fn rejects_empty_image() {
        let engine = Arc::new(FakeEngine::new());
        let err = Container::new(engine, ContainerOptions::new("", "web")).unwrap_err();
        assert_eq!(err.kind(), LifecycleErrorKind::Configuration);
    }

    #[test]
    fn rejects_empty_name() {
        let engine = Arc::new(FakeEngine::new());
        let err = Container::new(engine, ContainerOptions::new("redis", "")).unwrap_err();
        assert_eq!(err.kind(), LifecycleErrorKind::Configuration);
    }

    #[test]
    fn strips_leading_slash_and_normalizes_binds() {
        let engine = Arc::new(FakeEngine::new());
        let c = Container::new(
            engine,
            ContainerOptions::new("redis", "/cache")
                .bind("/srv/redis:/data")
                .bind("/etc/redis:/etc/redis:ro"),
        )
        .unwrap();
        assert_eq!(c.name(), "cache");
        assert_eq!(
            c.options().binds,
            vec!["/srv/redis:/data:rw", "/etc/redis:/etc/redis:ro"]
        );
    }

    #[test]
    fn new_handle_is_unbound() {
        let engine = Arc::new(FakeEngine::new());
        let c = handle(&engine, "cache");
        assert!(c.id().is_none());
        assert_eq!(c.short_id(), "");
        assert!(!c.is_running());
        assert_eq!(c.envs(), ["MODE=primary"]);
    }
}

// =============================================================================
// Create / Start / Stop
// =============================================================================

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn create_binds_handle_and_records_ports() {
        support::init_tracing();
        let engine = Arc::new(FakeEngine::new());
        let mut c = handle(&engine, "cache1");

        c.create().await.unwrap();

        assert!(c.id().is_some());
        assert_eq!(c.short_id().len(), 12);
        let ports = c.ports().unwrap();
        assert_eq!(
            ports["6379/tcp"],
            vec![HostBinding {
                host_ip: "0.0.0.0".to_string(),
                host_port: "16379".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn create_sends_full_request() {
        let engine = Arc::new(FakeEngine::new());
        let mut c = Container::new(
            Arc::clone(&engine),
            redis_options("cache1")
                .hostname("cache")
                .link("db:db")
                .resources(ResourceLimits {
                    memory: Some(512 * 1024 * 1024),
                    memory_swap: Some(1024 * 1024 * 1024),
                    cpu_shares: Some(512),
                    cpuset: Some("0,1".to_string()),
                }),
        )
        .unwrap();

        c.create().await.unwrap();

        let snapshot = c.snapshot().unwrap();
        assert_eq!(snapshot.config.exposed_ports, vec!["6379/tcp"]);
        assert_eq!(
            snapshot.config.cmd,
            vec!["redis-server", "--appendonly", "yes"]
        );
        assert_eq!(snapshot.config.hostname.as_deref(), Some("cache"));
        assert_eq!(snapshot.host_config.links, vec!["db:db"]);
        assert_eq!(snapshot.host_config.memory, Some(512 * 1024 * 1024));
        assert_eq!(snapshot.host_config.cpuset_cpus.as_deref(), Some("0,1"));
    }

    #[tokio::test]
    async fn create_failure_leaves_handle_unbound() {
        let engine = Arc::new(FakeEngine::new());
        engine.configure(|s| {
            s.fail_create.insert("cache1".to_string());
        });
        let mut c = handle(&engine, "cache1");

        let err = c.create().await.unwrap_err();

        assert!(matches!(err, LifecycleError::Create { .. }));
        assert_eq!(err.kind(), LifecycleErrorKind::Engine);
        assert!(c.id().is_none());
    }

    #[tokio::test]
    async fn start_refreshes_observed_state() {
        let engine = Arc::new(FakeEngine::new());
        let mut c = created(&engine, "cache1").await;
        assert!(!c.is_running());

        c.start().await.unwrap();

        assert!(c.is_running());
        let calls = engine.calls();
        assert!(matches!(calls[0], Call::Start(_)));
        assert!(matches!(calls[1], Call::Inspect(_)));
    }

    #[tokio::test]
    async fn stop_uses_fixed_grace_period() {
        let engine = Arc::new(FakeEngine::new());
        let mut c = created(&engine, "cache1").await;
        c.start().await.unwrap();

        c.stop().await.unwrap();

        assert!(!c.is_running());
        assert_eq!(
            engine.count(|call| matches!(call, Call::Stop(_, grace) if *grace == STOP_GRACE_PERIOD)),
            1
        );
    }

    #[tokio::test]
    async fn operations_on_unbound_handle_touch_nothing() {
        let engine = Arc::new(FakeEngine::new());
        let mut c = handle(&engine, "cache1");

        assert_eq!(c.start().await.unwrap_err().kind(), LifecycleErrorKind::NotFound);
        assert_eq!(c.stop().await.unwrap_err().kind(), LifecycleErrorKind::NotFound);
        assert_eq!(c.refresh().await.unwrap_err().kind(), LifecycleErrorKind::NotFound);
        assert_eq!(
            c.rename("other").await.unwrap_err().kind(),
            LifecycleErrorKind::NotFound
        );
        assert!(engine.calls().is_empty());
    }
}

// =============================================================================
// Remove
// =============================================================================

mod remove {
    use super::*;

    #[tokio::test]
    async fn graceful_remove_succeeds_first_try() {
        let engine = Arc::new(FakeEngine::new());
        let mut c = created(&engine, "cache1").await;

        c.remove(false).await.unwrap();

        assert_eq!(engine.count(is_remove), 1);
        assert!(c.id().is_none());
        assert!(c.snapshot().is_none());
        assert_eq!(engine.container_count(), 0);
    }

    #[tokio::test]
    async fn graceful_failure_escalates_to_forced() {
        support::init_tracing();
        let engine = Arc::new(FakeEngine::new());
        let mut c = created(&engine, "cache1").await;
        engine.configure(|s| s.fail_graceful_remove = true);

        c.remove(true).await.unwrap();

        let removes: Vec<_> = engine.calls().into_iter().filter(is_remove).collect();
        assert_eq!(removes.len(), 2);
        assert!(matches!(
            removes[0],
            Call::Remove {
                force: false,
                volumes: true,
                ..
            }
        ));
        assert!(matches!(
            removes[1],
            Call::Remove {
                force: true,
                volumes: true,
                ..
            }
        ));
        assert!(c.id().is_none());
    }

    #[tokio::test]
    async fn falls_back_to_removal_by_name() {
        let engine = Arc::new(FakeEngine::new());
        let mut c = created(&engine, "cache1").await;
        engine.configure(|s| s.fail_remove_by_id = true);

        c.remove(false).await.unwrap();

        let targets: Vec<String> = engine
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Remove { target, .. } => Some(target),
                _ => None,
            })
            .collect();
        assert_eq!(targets.len(), 3);
        assert_eq!(targets[2], "cache1");
        assert!(c.id().is_none());
    }

    #[tokio::test]
    async fn reports_last_error_when_everything_fails() {
        let engine = Arc::new(FakeEngine::new());
        let mut c = created(&engine, "cache1").await;
        engine.configure(|s| s.fail_remove = true);

        let err = c.remove(false).await.unwrap_err();

        assert!(matches!(err, LifecycleError::Remove { ref name, .. } if name == "cache1"));
        assert_eq!(engine.count(is_remove), 4);
        assert!(c.id().is_some(), "failed remove keeps the handle bound");
    }

    #[tokio::test]
    async fn unbound_remove_makes_no_engine_calls() {
        let engine = Arc::new(FakeEngine::new());
        let mut c = handle(&engine, "cache1");

        let err = c.remove(false).await.unwrap_err();

        assert_eq!(err.kind(), LifecycleErrorKind::NotFound);
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn second_remove_is_not_found() {
        let engine = Arc::new(FakeEngine::new());
        let mut c = created(&engine, "cache1").await;
        c.remove(false).await.unwrap();

        let err = c.remove(false).await.unwrap_err();
        assert_eq!(err.kind(), LifecycleErrorKind::NotFound);
    }

    #[tokio::test]
    async fn stop_and_remove_skips_remove_when_stop_fails() {
        let engine = Arc::new(FakeEngine::new());
        let mut c = created(&engine, "cache1").await;
        engine.configure(|s| s.fail_stop = true);

        let err = c.stop_and_remove(false).await.unwrap_err();

        assert!(matches!(err, LifecycleError::Stop { .. }));
        assert_eq!(engine.count(is_remove), 0);
        assert!(c.id().is_some());
    }

    #[tokio::test]
    async fn stop_and_remove_unbinds() {
        let engine = Arc::new(FakeEngine::new());
        let mut c = created(&engine, "cache1").await;
        c.start().await.unwrap();

        c.stop_and_remove(true).await.unwrap();

        assert!(c.id().is_none());
        assert_eq!(engine.container_count(), 0);
    }

    #[tokio::test]
    async fn stop_and_remove_ignores_unreadable_state_after_stop() {
        let engine = Arc::new(FakeEngine::new());
        let mut c = created(&engine, "cache1").await;
        c.start().await.unwrap();
        engine.configure(|s| s.fail_inspect = true);
        engine.clear_calls();

        c.stop_and_remove(false).await.unwrap();

        assert!(c.id().is_none());
        assert_eq!(engine.container_count(), 0);
        assert!(engine.count(is_remove) >= 1);
        assert_eq!(engine.count(|call| matches!(call, Call::Inspect(_))), 0);
    }

    #[tokio::test]
    async fn plain_stop_reports_refresh_failure() {
        let engine = Arc::new(FakeEngine::new());
        let mut c = created(&engine, "cache1").await;
        c.start().await.unwrap();
        engine.configure(|s| s.fail_inspect = true);

        let err = c.stop().await.unwrap_err();

        assert!(matches!(err, LifecycleError::Refresh { .. }));
        assert!(c.id().is_some());
    }
}

// =============================================================================
// Run
// =============================================================================

mod run {
    use super::*;

    #[tokio::test]
    async fn pulls_when_image_missing() {
        support::init_tracing();
        let engine = Arc::new(FakeEngine::new());
        let mut c = handle(&engine, "cache1");

        c.run().await.unwrap();

        let calls = engine.calls();
        assert_eq!(calls[0], Call::ImageExists("redis:latest".to_string()));
        assert_eq!(calls[1], Call::Pull("redis:latest".to_string()));
        assert_eq!(calls[2], Call::Create("cache1".to_string()));
        assert!(matches!(calls[3], Call::Start(_)));
        assert!(c.is_running());
    }

    #[tokio::test]
    async fn skips_pull_when_image_present() {
        let engine = Arc::new(FakeEngine::new());
        engine.configure(|s| s.image_present = true);
        let mut c = handle(&engine, "cache1");

        c.run().await.unwrap();

        assert_eq!(engine.count(|call| matches!(call, Call::Pull(_))), 0);
        assert!(c.is_running());
    }

    #[tokio::test]
    async fn pull_failure_stops_before_create() {
        let engine = Arc::new(FakeEngine::new());
        engine.configure(|s| s.fail_pull = true);
        let mut c = handle(&engine, "cache1");

        let err = c.run().await.unwrap_err();

        assert!(matches!(err, LifecycleError::Download { .. }));
        assert_eq!(engine.count(|call| matches!(call, Call::Create(_))), 0);
    }

    #[tokio::test]
    async fn create_failure_is_wrapped_with_run_step() {
        let engine = Arc::new(FakeEngine::new());
        engine.configure(|s| {
            s.image_present = true;
            s.fail_create.insert("cache1".to_string());
        });
        let mut c = handle(&engine, "cache1");

        let err = c.run().await.unwrap_err();

        assert!(matches!(err, LifecycleError::RunCreate { .. }));
        assert_eq!(err.kind(), LifecycleErrorKind::Engine);
        assert_eq!(engine.count(|call| matches!(call, Call::Start(_))), 0);
    }

    #[tokio::test]
    async fn start_failure_is_wrapped_with_run_step() {
        let engine = Arc::new(FakeEngine::new());
        engine.configure(|s| {
            s.image_present = true;
            s.fail_start = true;
        });
        let mut c = handle(&engine, "cache1");

        let err = c.run().await.unwrap_err();

        assert!(matches!(err, LifecycleError::RunStart { .. }));
        assert!(c.id().is_some(), "container was created before start failed");
    }

    #[tokio::test]
    async fn forwards_pull_progress() {
        let engine = Arc::new(FakeEngine::new());
        let mut c = handle(&engine, "cache1");
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        c.run_with_progress(Some(&tx)).await.unwrap();

        let progress = rx.recv().await.unwrap();
        assert_eq!(progress.to_string(), "layer1: Pull complete");
    }
}

// =============================================================================
// Rename / Clone / Logs
// =============================================================================

mod misc {
    use super::*;

    #[tokio::test]
    async fn rename_strips_slash_and_refreshes() {
        let engine = Arc::new(FakeEngine::new());
        let mut c = created(&engine, "cache1").await;

        c.rename("/cache2").await.unwrap();

        assert_eq!(c.name(), "cache2");
        assert_eq!(c.snapshot().unwrap().name, "cache2");
        assert!(
            engine
                .calls()
                .iter()
                .any(|call| matches!(call, Call::Rename(_, to) if to == "cache2"))
        );
    }

    #[tokio::test]
    async fn rename_to_empty_is_configuration_error() {
        let engine = Arc::new(FakeEngine::new());
        let mut c = created(&engine, "cache1").await;

        let err = c.rename("/").await.unwrap_err();

        assert_eq!(err.kind(), LifecycleErrorKind::Configuration);
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn clone_copies_config_without_identity() {
        let engine = Arc::new(FakeEngine::new());
        let mut original = created(&engine, "cache1").await;
        original.start().await.unwrap();

        let mut copy = original.clone();

        assert_eq!(copy.options(), original.options());
        assert!(copy.id().is_none());
        assert!(copy.snapshot().is_none());
        assert!(!copy.is_running());

        copy.create().await.unwrap();
        assert_ne!(copy.id(), original.id());
        assert!(original.is_running());
    }

    #[tokio::test]
    async fn editing_clone_leaves_original_untouched() {
        let engine = Arc::new(FakeEngine::new());
        let original = handle(&engine, "cache1");
        let before = original.options().clone();

        let mut copy = original.clone();
        let opts = copy.options_mut();
        opts.name = "cache2".to_string();
        opts.image = "redis:7".to_string();
        opts.env.push("EXTRA=1".to_string());
        opts.port_bindings[0].host_port = Some(26379);
        opts.binds.push("/srv/copy:/data".to_string());

        assert_eq!(original.options(), &before);
        assert_eq!(original.name(), "cache1");
        assert_eq!(original.image(), "redis:latest");

        copy.create().await.unwrap();
        assert_eq!(copy.name(), "cache2");
        assert_eq!(copy.options().binds, vec!["/srv/copy:/data:rw"]);
        assert!(matches!(&engine.calls()[0], Call::Create(name) if name == "cache2"));
        assert_eq!(original.options(), &before);
        assert!(original.id().is_none());
    }

    #[tokio::test]
    async fn renaming_bound_clone_leaves_original_untouched() {
        let engine = Arc::new(FakeEngine::new());
        let mut original = created(&engine, "cache1").await;
        let before = original.options().clone();

        let mut copy = original.clone();
        copy.create().await.unwrap();
        copy.rename("cache1-copy").await.unwrap();

        assert_eq!(copy.name(), "cache1-copy");
        assert_eq!(original.name(), "cache1");
        assert_eq!(original.options(), &before);

        original.refresh().await.unwrap();
        assert_eq!(original.snapshot().unwrap().name, "cache1");
    }

    #[tokio::test]
    async fn create_rejects_edited_empty_name() {
        let engine = Arc::new(FakeEngine::new());
        let mut c = handle(&engine, "cache1");
        c.options_mut().name = "/".to_string();

        let err = c.create().await.unwrap_err();

        assert_eq!(err.kind(), LifecycleErrorKind::Configuration);
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn envs_prefer_observed_state() {
        let engine = Arc::new(FakeEngine::new());
        let c = created(&engine, "cache1").await;
        assert_eq!(c.envs(), ["MODE=primary"]);
    }

    #[tokio::test]
    async fn logs_stream_configured_lines() {
        let engine = Arc::new(FakeEngine::new());
        engine.configure(|s| {
            s.log_lines = vec!["one".to_string(), "two".to_string(), "three".to_string()];
        });
        let c = created(&engine, "cache1").await;

        let lines: Vec<String> = c
            .logs(&dockyard::engine::traits::LogOptions::tail(2))
            .await
            .unwrap()
            .map(|l| l.unwrap().content)
            .collect()
            .await;

        assert_eq!(lines, vec!["two", "three"]);
    }
}
