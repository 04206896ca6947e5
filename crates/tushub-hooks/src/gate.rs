//! Pre-create admission gate.

use std::sync::Arc;

use tushub_core::{HookEvent, HookType};

use crate::dispatcher::HookDispatcher;
use crate::error::{InvocationError, PreCreateError};

/// Synchronous veto over upload creation.
///
/// The upload pipeline calls [`check`](Self::check) before admitting an
/// upload and waits for the answer. Retries, if any, happen inside the
/// backend.
#[derive(Debug, Clone)]
pub struct PreCreateGate {
    dispatcher: Arc<HookDispatcher>,
}

impl PreCreateGate {
    /// Creates a gate backed by `dispatcher`.
    pub fn new(dispatcher: Arc<HookDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Runs the `pre-create` hook for `event`.
    ///
    /// `Ok` admits the upload. A structured rejection keeps the hook's
    /// status and body so they can be returned to the client verbatim.
    pub async fn check(&self, event: &HookEvent) -> Result<(), PreCreateError> {
        let InvocationError { error, output } =
            match self.dispatcher.invoke(HookType::PreCreate, event, true).await {
                Ok(_) => return Ok(()),
                Err(err) => err,
            };

        let status_code = error.status_code();
        let body = error.body().cloned();

        match (status_code, body) {
            (Some(status_code), Some(body)) => Err(PreCreateError::Rejected {
                status_code,
                body,
                source: error,
            }),
            _ => Err(PreCreateError::Failed {
                output: String::from_utf8_lossy(&output).into_owned(),
                source: error,
            }),
        }
    }
}
