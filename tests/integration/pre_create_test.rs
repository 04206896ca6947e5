//! Integration tests for the pre-create admission gate.

mod helpers;

use tushub_core::HookType;
use tushub_core::config::{AppConfig, BackendConfig, HttpHookConfig};
use tushub_hooks::testing::{MockHttpServer, StubBackend};
use tushub_hooks::{HookError, HookManager, PreCreateError};

use helpers::TestHooks;

fn http_config(endpoint: String) -> AppConfig {
    let mut config = AppConfig::default();
    config.hooks.backend = BackendConfig::Http(HttpHookConfig {
        endpoint,
        max_retries: 0,
        backoff_seconds: 0,
        timeout_seconds: 5,
    });
    config
}

#[tokio::test]
async fn test_stub_rejection_passes_through_unchanged() {
    let hooks = TestHooks::new(
        StubBackend::new()
            .with_return_code(409)
            .with_error(HookError::rejected("upload already exists", 409, "duplicate")),
    );
    let gate = hooks.manager.pre_create_gate().expect("gate");

    let err = gate
        .check(&helpers::event("abc", 1))
        .await
        .expect_err("rejected");

    assert_eq!(err.status_code(), 409);
    assert_eq!(err.body().as_ref(), b"duplicate");
    assert!(err.to_string().starts_with("pre-create hook failed: "));
    assert!(err.to_string().contains("upload already exists"));
    assert_eq!(hooks.manager.metrics().errors(HookType::PreCreate), 1);

    let calls = hooks.backend.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].capture_output);
}

#[tokio::test]
async fn test_http_rejection_reaches_client_verbatim() {
    let server = MockHttpServer::start(vec![(409, "duplicate".to_string())]).await;
    let manager = HookManager::from_config(&http_config(server.url()))
        .await
        .expect("manager");
    let gate = manager.pre_create_gate().expect("gate");

    let err = gate
        .check(&helpers::event("abc", 1))
        .await
        .expect_err("rejected");

    assert!(matches!(err, PreCreateError::Rejected { .. }));
    assert_eq!(err.status_code(), 409);
    assert_eq!(err.body().as_ref(), b"duplicate");
    assert!(err.to_string().starts_with("pre-create hook failed: endpoint returned: 409"));

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].header("Hook-Name"), Some("pre-create"));
}

#[tokio::test]
async fn test_http_success_admits_upload() {
    let server = MockHttpServer::start(vec![(200, "{}".to_string())]).await;
    let manager = HookManager::from_config(&http_config(server.url()))
        .await
        .expect("manager");

    manager
        .pre_create_gate()
        .expect("gate")
        .check(&helpers::event("abc", 1))
        .await
        .expect("admitted");
}

#[tokio::test]
async fn test_generic_failure_carries_output() {
    let hooks = TestHooks::new(
        StubBackend::new()
            .with_output("disk quota exceeded")
            .with_error(HookError::ExitStatus { code: 1 }),
    );

    let err = hooks
        .manager
        .pre_create_gate()
        .expect("gate")
        .check(&helpers::event("abc", 1))
        .await
        .expect_err("rejected");

    assert!(matches!(err, PreCreateError::Failed { .. }));
    assert_eq!(err.status_code(), 500);
    assert!(err.to_string().contains("hook exited with status 1"));
    assert!(err.to_string().contains("disk quota exceeded"));
}

#[tokio::test]
async fn test_no_backend_means_no_gate() {
    let manager = HookManager::from_config(&AppConfig::default())
        .await
        .expect("manager");
    assert!(manager.pre_create_gate().is_none());
}
