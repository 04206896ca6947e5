//! Integration tests for hook dispatch side effects: logs, metrics,
//! stop-upload, and finished-upload cleanup.

mod helpers;

use std::sync::Arc;

use tushub_core::HookType;
use tushub_hooks::HookError;
use tushub_hooks::testing::{CountingStopHandle, LogCapture, StubBackend};

use helpers::TestHooks;

#[tokio::test]
async fn test_post_finish_scenario() {
    let (logs, _guard) = LogCapture::install();
    let hooks = TestHooks::with_config(
        StubBackend::new(),
        helpers::hooks_config(&[HookType::PostFinish], 0),
    );

    hooks
        .manager
        .dispatcher()
        .invoke(HookType::PostFinish, &helpers::event("abc", 1024), false)
        .await
        .expect("dispatch");

    let finished = logs.events_named("UploadFinished");
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].field("id"), Some("abc"));
    assert_eq!(finished[0].field("size"), Some("1024"));

    let calls = hooks.backend.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].hook, HookType::PostFinish);
    assert_eq!(hooks.manager.metrics().errors(HookType::PostFinish), 0);
}

#[tokio::test]
async fn test_disabled_types_make_zero_backend_calls() {
    let hooks = TestHooks::with_config(
        StubBackend::new(),
        helpers::hooks_config(&[HookType::PostFinish], 0),
    );
    let dispatcher = hooks.manager.dispatcher();

    for hook in [HookType::PostCreate, HookType::PostReceive, HookType::PostTerminate] {
        dispatcher
            .invoke_async(hook, helpers::event("abc", 1))
            .await
            .expect("task");
    }
    assert!(hooks.manager.pre_create_gate().is_some());
    hooks
        .manager
        .pre_create_gate()
        .expect("gate")
        .check(&helpers::event("abc", 1))
        .await
        .expect("admitted");

    assert_eq!(hooks.backend.call_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_failures_are_all_counted() {
    let hooks = TestHooks::new(
        StubBackend::new().with_error(HookError::Transport("connection refused".into())),
    );
    let dispatcher = hooks.manager.dispatcher();

    let handles: Vec<_> = (0..200)
        .map(|i| dispatcher.invoke_async(HookType::PostReceive, helpers::event(&format!("u{i}"), 1)))
        .collect();
    for handle in handles {
        handle.await.expect("task");
    }

    let snapshot = hooks.manager.metrics().snapshot();
    assert_eq!(snapshot.post_receive, 200);
    assert_eq!(snapshot.post_create, 0);
    assert_eq!(snapshot.pre_create, 0);
    assert!(
        hooks
            .manager
            .metrics()
            .render_prometheus()
            .expect("render")
            .contains("tushub_hook_errors_total{hooktype=\"post-receive\"} 200")
    );
}

#[tokio::test]
async fn test_failed_call_counts_and_logs_once() {
    let (logs, _guard) = LogCapture::install();
    let hooks = TestHooks::new(StubBackend::new().with_error(HookError::ExitStatus { code: 2 }));

    let _ = hooks
        .manager
        .dispatcher()
        .invoke(HookType::PostTerminate, &helpers::event("xyz", 0), false)
        .await;

    assert_eq!(hooks.manager.metrics().errors(HookType::PostTerminate), 1);
    assert_eq!(logs.count("UploadTerminated"), 1);
    let errors = logs.events_named("HookInvocationError");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].level, tracing::Level::ERROR);
    assert_eq!(errors[0].field("type"), Some("post-terminate"));
    assert_eq!(logs.count("HookInvocationStart"), 1);
    assert_eq!(logs.count("HookInvocationFinish"), 0);
}

#[tokio::test]
async fn test_stop_code_triggers_exactly_once() {
    let hooks = TestHooks::with_config(
        StubBackend::new().with_return_code(7),
        helpers::hooks_config(&HookType::ALL, 7),
    );
    let stop = Arc::new(CountingStopHandle::new());
    let event = helpers::event("abc", 100).with_stop_handle(stop.clone());

    hooks
        .manager
        .dispatcher()
        .invoke_async(HookType::PostReceive, event)
        .await
        .expect("task");

    assert_eq!(stop.count(), 1);
}

#[tokio::test]
async fn test_zero_stop_code_never_triggers() {
    let hooks = TestHooks::with_config(
        StubBackend::new().with_return_code(0),
        helpers::hooks_config(&HookType::ALL, 0),
    );
    let stop = Arc::new(CountingStopHandle::new());
    let event = helpers::event("abc", 100).with_stop_handle(stop.clone());

    hooks
        .manager
        .dispatcher()
        .invoke_async(HookType::PostReceive, event)
        .await
        .expect("task");

    assert_eq!(stop.count(), 0);
}

#[tokio::test]
async fn test_no_backend_still_logs_and_cleans_up() {
    let (logs, _guard) = LogCapture::install();
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("abc.info"), "{}").expect("write info");
    std::fs::write(dir.path().join("abc"), vec![0u8; 1024]).expect("write data");

    let manager = helpers::manager_without_backend(dir.path());
    assert!(manager.pre_create_gate().is_none());

    let dispatcher = manager.dispatcher();
    let output = dispatcher
        .invoke(HookType::PostFinish, &helpers::event("abc", 1024), true)
        .await
        .expect("dispatch");
    assert!(output.is_empty());
    dispatcher
        .invoke(HookType::PostTerminate, &helpers::event("def", 0), false)
        .await
        .expect("dispatch");

    assert_eq!(logs.count("UploadFinished"), 1);
    assert_eq!(logs.count("UploadTerminated"), 1);
    assert_eq!(logs.count("HookInvocationStart"), 0);
    assert!(!dir.path().join("abc.info").exists());
    assert!(!dir.path().join("abc").exists());
}

#[cfg(unix)]
#[tokio::test]
async fn test_file_backend_stop_code() {
    use std::os::unix::fs::PermissionsExt;
    use tushub_core::config::{AppConfig, BackendConfig, FileHookConfig};
    use tushub_hooks::HookManager;

    let dir = tempfile::tempdir().expect("tempdir");
    let script = dir.path().join("post-receive");
    std::fs::write(&script, "#!/bin/sh\ncat > /dev/null\nexit 9\n").expect("write hook");
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).expect("chmod");

    let mut config = AppConfig::default();
    config.hooks.stop_upload_code = 9;
    config.hooks.backend = BackendConfig::File(FileHookConfig {
        directory: dir.path().to_string_lossy().into_owned(),
    });
    config.storage.remove_finished = false;

    let manager = HookManager::from_config(&config).await.expect("manager");
    let stop = Arc::new(CountingStopHandle::new());
    let event = helpers::event("abc", 10).with_stop_handle(stop.clone());

    let err = manager
        .dispatcher()
        .invoke(HookType::PostReceive, &event, false)
        .await
        .expect_err("non-zero exit");

    assert!(matches!(err.error, HookError::ExitStatus { code: 9 }));
    assert_eq!(stop.count(), 1);
    assert_eq!(manager.metrics().errors(HookType::PostReceive), 1);
}
