//! # tushub-hooks
//!
//! Hook notification dispatch for the TusHub upload pipeline. Provides:
//!
//! - Hook dispatcher with enabled-type filtering, error metrics, and the
//!   `post-receive` stop-upload signal
//! - Pre-create gate that can veto upload creation
//! - Event router fanning lifecycle events out to asynchronous dispatches
//! - Pluggable backends: executables, HTTP, gRPC (`grpc` feature), and
//!   shared libraries (`dynamic` feature)

pub mod backend;
pub mod dispatcher;
pub mod error;
pub mod ffi;
pub mod finish;
pub mod gate;
pub mod manager;
pub mod metrics;
pub mod router;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use backend::{HookBackend, HookOutcome};
pub use dispatcher::HookDispatcher;
pub use error::{HookError, InvocationError, PreCreateError};
pub use finish::{FinishedUploadAction, LocalStateCleanup};
pub use gate::PreCreateGate;
pub use manager::HookManager;
pub use metrics::{HookMetrics, HookMetricsSnapshot};
pub use router::EventRouter;
