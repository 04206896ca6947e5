//! Routes upload lifecycle events to asynchronous hook dispatches.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use tushub_core::HookType;
use tushub_core::events::UploadEvents;

use crate::dispatcher::HookDispatcher;

/// Long-lived task turning lifecycle events into hook dispatches.
///
/// Each event is handed to its own task, so a slow hook never delays
/// the next event. No ordering holds between dispatches.
#[derive(Debug, Clone)]
pub struct EventRouter {
    dispatcher: Arc<HookDispatcher>,
}

impl EventRouter {
    /// Creates a router dispatching through `dispatcher`.
    pub fn new(dispatcher: Arc<HookDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Runs the router on a new task.
    pub fn spawn(self, events: UploadEvents) -> JoinHandle<()> {
        tokio::spawn(self.run(events))
    }

    /// Observes the four event sources until all of them are closed.
    pub async fn run(self, mut events: UploadEvents) {
        info!("Hook event router started");

        loop {
            let (hook, event) = tokio::select! {
                Some(event) = events.completed.recv() => (HookType::PostFinish, event),
                Some(event) = events.terminated.recv() => (HookType::PostTerminate, event),
                Some(event) = events.progress.recv() => (HookType::PostReceive, event),
                Some(event) = events.created.recv() => (HookType::PostCreate, event),
                else => break,
            };

            debug!(hook = %hook, id = %event.id(), "Routing upload event");
            self.dispatcher.invoke_async(hook, event);
        }

        info!("All upload event sources closed, hook event router stopped");
    }
}
