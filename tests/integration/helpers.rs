//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use tushub_core::config::{AppConfig, HooksConfig};
use tushub_core::{FileInfo, HookEvent, HookType};
use tushub_hooks::testing::StubBackend;
use tushub_hooks::{HookBackend, HookDispatcher, HookManager, LocalStateCleanup};

/// Hook manager wired to a recording stub backend.
pub struct TestHooks {
    /// The stub every dispatch goes to.
    pub backend: Arc<StubBackend>,
    /// Manager under test.
    pub manager: HookManager,
}

impl TestHooks {
    /// All hooks enabled, no stop code.
    pub fn new(backend: StubBackend) -> Self {
        Self::with_config(backend, hooks_config(&HookType::ALL, 0))
    }

    /// Custom dispatch settings.
    pub fn with_config(backend: StubBackend, config: HooksConfig) -> Self {
        let backend = Arc::new(backend);
        let dyn_backend: Arc<dyn HookBackend> = backend.clone();
        let manager = HookManager::new(HookDispatcher::new(Some(dyn_backend), &config));
        Self { backend, manager }
    }
}

/// Dispatch settings enabling `enabled` with the given stop code.
pub fn hooks_config(enabled: &[HookType], stop_upload_code: i32) -> HooksConfig {
    HooksConfig {
        enabled_hooks: enabled.iter().copied().collect(),
        stop_upload_code,
        ..HooksConfig::default()
    }
}

/// Manager without a backend that cleans up finished uploads in `upload_dir`.
pub fn manager_without_backend(upload_dir: &std::path::Path) -> HookManager {
    let dispatcher = HookDispatcher::new(None, &AppConfig::default().hooks)
        .with_finish_action(Arc::new(LocalStateCleanup::new(upload_dir)));
    HookManager::new(dispatcher)
}

/// Event for upload `id` of `size` bytes.
pub fn event(id: &str, size: u64) -> HookEvent {
    HookEvent::new(FileInfo::new(id, size))
}
