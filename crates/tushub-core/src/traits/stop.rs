//! Stop-upload capability handed out by the upload pipeline.

use tokio_util::sync::CancellationToken;

/// Lets a hook abort an in-flight upload.
///
/// Implemented by the upload pipeline for the object that owns the upload.
/// Only meaningful for `post-receive` events.
pub trait StopUpload: Send + Sync + std::fmt::Debug {
    /// Signal the owning upload to stop receiving data.
    fn stop_upload(&self);
}

impl StopUpload for CancellationToken {
    fn stop_upload(&self) {
        self.cancel();
    }
}
