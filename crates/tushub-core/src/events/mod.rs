//! Upload lifecycle events.
//!
//! The upload pipeline owns an [`UploadEventSenders`] and publishes one
//! [`HookEvent`] per lifecycle change; the hook router consumes the
//! matching [`UploadEvents`].

pub mod upload;

use tokio::sync::mpsc;

pub use upload::{FileInfo, HookEvent, HttpRequestInfo};

/// Sending half of the four lifecycle event sources.
#[derive(Debug, Clone)]
pub struct UploadEventSenders {
    /// Uploads that were just created.
    pub created: mpsc::Sender<HookEvent>,
    /// Uploads that received more data.
    pub progress: mpsc::Sender<HookEvent>,
    /// Uploads that completed.
    pub completed: mpsc::Sender<HookEvent>,
    /// Uploads that were terminated.
    pub terminated: mpsc::Sender<HookEvent>,
}

/// Receiving half of the four lifecycle event sources.
#[derive(Debug)]
pub struct UploadEvents {
    /// Uploads that were just created.
    pub created: mpsc::Receiver<HookEvent>,
    /// Uploads that received more data.
    pub progress: mpsc::Receiver<HookEvent>,
    /// Uploads that completed.
    pub completed: mpsc::Receiver<HookEvent>,
    /// Uploads that were terminated.
    pub terminated: mpsc::Receiver<HookEvent>,
}

/// Creates the four connected channels, each buffering up to `capacity`
/// events.
///
/// A full channel makes the pipeline wait, which is the only backpressure
/// applied to hook dispatch.
pub fn channels(capacity: usize) -> (UploadEventSenders, UploadEvents) {
    let (created_tx, created_rx) = mpsc::channel(capacity);
    let (progress_tx, progress_rx) = mpsc::channel(capacity);
    let (completed_tx, completed_rx) = mpsc::channel(capacity);
    let (terminated_tx, terminated_rx) = mpsc::channel(capacity);

    (
        UploadEventSenders {
            created: created_tx,
            progress: progress_tx,
            completed: completed_tx,
            terminated: terminated_tx,
        },
        UploadEvents {
            created: created_rx,
            progress: progress_rx,
            completed: completed_rx,
            terminated: terminated_rx,
        },
    )
}
