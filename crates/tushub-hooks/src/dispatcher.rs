//! Hook dispatcher.
//!
//! Runs one hook invocation end to end: the enabled-type short circuit,
//! built-in side effects of `post-finish` and `post-terminate`, the backend
//! call, error logging and metrics, and the `post-receive` stop signal.

use std::sync::Arc;

use bytes::Bytes;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use tushub_core::config::HooksConfig;
use tushub_core::{EnabledHooks, FileInfo, HookEvent, HookType};

use crate::backend::{HookBackend, HookOutcome};
use crate::error::InvocationError;
use crate::finish::FinishedUploadAction;
use crate::metrics::HookMetrics;

/// Dispatches hook invocations to the configured backend.
///
/// Immutable after construction and shared behind an [`Arc`] by the
/// pre-create gate, the event router, and every spawned dispatch task.
#[derive(Debug)]
pub struct HookDispatcher {
    /// Backend selected at startup, if any.
    backend: Option<Arc<dyn HookBackend>>,
    /// Hook types that are dispatched at all.
    enabled: EnabledHooks,
    /// `post-receive` return code that stops the upload, `0` for none.
    stop_upload_code: i32,
    /// Log start and finish of every invocation.
    verbose: bool,
    /// Error counters.
    metrics: Arc<HookMetrics>,
    /// Actions run when an upload finishes.
    finish_actions: Vec<Arc<dyn FinishedUploadAction>>,
}

impl HookDispatcher {
    /// Creates a dispatcher for `backend` using the dispatch settings of `config`.
    pub fn new(backend: Option<Arc<dyn HookBackend>>, config: &HooksConfig) -> Self {
        Self {
            backend,
            enabled: config.enabled_hooks.clone(),
            stop_upload_code: config.stop_upload_code,
            verbose: config.verbose,
            metrics: Arc::new(HookMetrics::new()),
            finish_actions: Vec::new(),
        }
    }

    /// Uses a shared metrics instance instead of a private one.
    pub fn with_metrics(mut self, metrics: Arc<HookMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Adds an action run on every enabled `post-finish` dispatch.
    pub fn with_finish_action(mut self, action: Arc<dyn FinishedUploadAction>) -> Self {
        self.finish_actions.push(action);
        self
    }

    /// Whether a backend is configured.
    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    /// Name of the configured backend.
    pub fn backend_name(&self) -> Option<&'static str> {
        self.backend.as_ref().map(|b| b.name())
    }

    /// Hook types that are dispatched.
    pub fn enabled_hooks(&self) -> &EnabledHooks {
        &self.enabled
    }

    /// Error counters.
    pub fn metrics(&self) -> &Arc<HookMetrics> {
        &self.metrics
    }

    /// Invokes `hook` for `event` and waits for the result.
    ///
    /// Disabled hook types return empty output without touching the
    /// backend or running any side effect. Without a backend, only the
    /// built-in side effects run.
    pub async fn invoke(
        &self,
        hook: HookType,
        event: &HookEvent,
        capture_output: bool,
    ) -> Result<Bytes, InvocationError> {
        if !self.enabled.contains(hook) {
            return Ok(Bytes::new());
        }

        match hook {
            HookType::PostFinish => {
                info!(
                    event = "UploadFinished",
                    id = %event.id(),
                    size = event.size(),
                    "Upload finished"
                );
                self.run_finish_actions(&event.upload).await;
            }
            HookType::PostTerminate => {
                info!(event = "UploadTerminated", id = %event.id(), "Upload terminated");
            }
            _ => {}
        }

        let Some(backend) = &self.backend else {
            return Ok(Bytes::new());
        };

        if self.verbose {
            info!(
                event = "HookInvocationStart",
                "type" = %hook,
                id = %event.id(),
                "Invoking hook"
            );
        }

        let HookOutcome {
            output,
            return_code,
            error,
        } = backend.invoke_hook(hook, event, capture_output).await;

        match &error {
            Some(err) => {
                error!(
                    event = "HookInvocationError",
                    "type" = %hook,
                    id = %event.id(),
                    error = %err,
                    "Hook invocation failed"
                );
                self.metrics.record_error(hook);
            }
            None if self.verbose => {
                info!(
                    event = "HookInvocationFinish",
                    "type" = %hook,
                    id = %event.id(),
                    "Hook invocation finished"
                );
            }
            None => {}
        }

        if hook == HookType::PostReceive && self.should_stop(return_code) {
            info!(event = "HookStopUpload", id = %event.id(), "Stopping upload");
            if !event.stop_upload() {
                warn!(id = %event.id(), "Event carries no stop handle");
            }
        }

        match error {
            Some(error) => Err(InvocationError { error, output }),
            None => Ok(output),
        }
    }

    /// Dispatches `hook` on a new task and discards its result.
    ///
    /// Only for the asynchronous hook types; `pre-create` goes through
    /// [`PreCreateGate`](crate::gate::PreCreateGate).
    pub fn invoke_async(self: &Arc<Self>, hook: HookType, event: HookEvent) -> JoinHandle<()> {
        debug_assert!(!hook.is_blocking(), "{hook} must be invoked synchronously");

        let dispatcher = Arc::clone(self);
        tokio::spawn(async move {
            // Failures are already logged and counted.
            let _ = dispatcher.invoke(hook, &event, false).await;
        })
    }

    fn should_stop(&self, return_code: i32) -> bool {
        self.stop_upload_code != 0 && self.stop_upload_code == return_code
    }

    async fn run_finish_actions(&self, upload: &FileInfo) {
        for action in &self.finish_actions {
            if let Err(e) = action.on_finished(upload).await {
                warn!(
                    action = action.name(),
                    id = %upload.id,
                    error = %e,
                    "Finished upload action failed"
                );
            }
        }
    }
}
