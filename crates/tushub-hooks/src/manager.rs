//! Hook manager: startup wiring of backend, dispatcher, gate, and router.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use tushub_core::config::AppConfig;
use tushub_core::events::UploadEvents;
use tushub_core::AppResult;

use crate::backend::{self, HookBackend};
use crate::dispatcher::HookDispatcher;
use crate::finish::LocalStateCleanup;
use crate::gate::PreCreateGate;
use crate::metrics::HookMetrics;
use crate::router::EventRouter;

/// Owns the hook dispatcher for the life of the process.
#[derive(Debug, Clone)]
pub struct HookManager {
    dispatcher: Arc<HookDispatcher>,
}

impl HookManager {
    /// Wraps an already configured dispatcher.
    pub fn new(dispatcher: HookDispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Selects and sets up the configured backend and builds the dispatcher.
    ///
    /// A backend whose setup fails aborts startup.
    pub async fn from_config(config: &AppConfig) -> AppResult<Self> {
        match backend::from_config(&config.hooks.backend)? {
            Some(backend) => Self::with_backend(backend, config).await,
            None => Ok(Self::new(Self::build_dispatcher(None, config))),
        }
    }

    /// Sets up a caller-supplied backend and builds the dispatcher around it.
    ///
    /// The backend section of `config` only provides the logged target.
    pub async fn with_backend(
        mut backend: Box<dyn HookBackend>,
        config: &AppConfig,
    ) -> AppResult<Self> {
        info!(
            backend = backend.name(),
            "Using '{}' for hooks",
            config.hooks.backend.target().unwrap_or(backend.name())
        );
        info!(
            "Enabled hook events: {}",
            config.hooks.enabled_hooks.describe()
        );

        backend.setup().await?;
        Ok(Self::new(Self::build_dispatcher(
            Some(Arc::from(backend)),
            config,
        )))
    }

    fn build_dispatcher(
        backend: Option<Arc<dyn HookBackend>>,
        config: &AppConfig,
    ) -> HookDispatcher {
        let dispatcher = HookDispatcher::new(backend, &config.hooks);
        if config.storage.remove_finished {
            let cleanup = LocalStateCleanup::new(&config.storage.upload_dir)
                .with_data_suffix(&config.storage.data_suffix);
            dispatcher.with_finish_action(Arc::new(cleanup))
        } else {
            dispatcher
        }
    }

    /// Gate for upload admission, or `None` when no backend is configured
    /// and uploads are admitted unconditionally.
    pub fn pre_create_gate(&self) -> Option<PreCreateGate> {
        self.dispatcher
            .has_backend()
            .then(|| PreCreateGate::new(Arc::clone(&self.dispatcher)))
    }

    /// Starts routing upload lifecycle events to asynchronous hooks.
    pub fn spawn_router(&self, events: UploadEvents) -> JoinHandle<()> {
        EventRouter::new(Arc::clone(&self.dispatcher)).spawn(events)
    }

    /// Returns the hook dispatcher for direct invocations.
    pub fn dispatcher(&self) -> &Arc<HookDispatcher> {
        &self.dispatcher
    }

    /// Returns the hook error counters.
    pub fn metrics(&self) -> &Arc<HookMetrics> {
        self.dispatcher.metrics()
    }
}
