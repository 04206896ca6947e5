//! Upload snapshot types carried by every hook event.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::traits::StopUpload;

/// State of an upload at the moment an event was emitted.
///
/// Field names follow the JSON payload that hook backends receive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileInfo {
    /// Unique upload identifier.
    #[serde(rename = "ID")]
    pub id: String,
    /// Total upload length in bytes.
    pub size: u64,
    /// Whether the length was not known when the upload was created.
    pub size_is_deferred: bool,
    /// Number of bytes received so far.
    pub offset: u64,
    /// Client supplied metadata.
    pub meta_data: HashMap<String, String>,
    /// Whether this is a partial upload meant for concatenation.
    pub is_partial: bool,
    /// Whether this is the final upload of a concatenation.
    pub is_final: bool,
    /// IDs of the partial uploads a final upload is made of.
    pub partial_uploads: Vec<String>,
    /// Storage details such as the file path or object key.
    pub storage: HashMap<String, String>,
}

impl FileInfo {
    /// Creates an upload snapshot with the given ID and size.
    pub fn new(id: impl Into<String>, size: u64) -> Self {
        Self {
            id: id.into(),
            size,
            ..Self::default()
        }
    }

    /// Sets the current offset.
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Inserts a metadata entry.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta_data.insert(key.into(), value.into());
        self
    }
}

/// The HTTP request that caused the event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HttpRequestInfo {
    /// HTTP method.
    pub method: String,
    /// Request URI.
    #[serde(rename = "URI")]
    pub uri: String,
    /// Remote peer address.
    pub remote_addr: String,
    /// Request headers.
    pub header: HashMap<String, Vec<String>>,
}

/// Immutable snapshot of an upload lifecycle event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HookEvent {
    /// The upload the event refers to.
    #[serde(rename = "Upload")]
    pub upload: FileInfo,
    /// The request that triggered the event.
    #[serde(rename = "HTTPRequest")]
    pub http_request: HttpRequestInfo,
    /// Handle to stop the owning upload, set for progress events.
    #[serde(skip)]
    stop_handle: Option<Arc<dyn StopUpload>>,
}

impl HookEvent {
    /// Creates an event for the given upload.
    pub fn new(upload: FileInfo) -> Self {
        Self {
            upload,
            http_request: HttpRequestInfo::default(),
            stop_handle: None,
        }
    }

    /// Attaches the originating request.
    pub fn with_request(mut self, request: HttpRequestInfo) -> Self {
        self.http_request = request;
        self
    }

    /// Attaches the capability to stop the owning upload.
    pub fn with_stop_handle(mut self, handle: Arc<dyn StopUpload>) -> Self {
        self.stop_handle = Some(handle);
        self
    }

    /// Upload identifier.
    pub fn id(&self) -> &str {
        &self.upload.id
    }

    /// Upload size in bytes.
    pub fn size(&self) -> u64 {
        self.upload.size
    }

    /// Signals the owning upload to stop.
    ///
    /// Returns `false` when the event carries no stop handle.
    pub fn stop_upload(&self) -> bool {
        match &self.stop_handle {
            Some(handle) => {
                handle.stop_upload();
                true
            }
            None => false,
        }
    }

    /// Serializes the event into the JSON payload sent to hook backends.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
