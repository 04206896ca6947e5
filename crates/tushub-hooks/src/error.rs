//! Invocation-time hook errors.
//!
//! Setup failures use [`tushub_core::AppError`]. Everything that can go
//! wrong while a single hook runs is a [`HookError`], and the pre-create
//! admission decision is a [`PreCreateError`].

use bytes::Bytes;
use thiserror::Error;

/// Status used when a pre-create failure carries no status of its own.
pub const DEFAULT_REJECTION_STATUS: u16 = 500;

/// Failure of a single hook invocation.
#[derive(Debug, Clone, Error)]
pub enum HookError {
    /// The hook deliberately rejected the upload with an HTTP-style response.
    #[error("{message}")]
    Rejected {
        /// Human readable reason.
        message: String,
        /// Status to answer the client with.
        status_code: u16,
        /// Response body to answer the client with.
        body: Bytes,
    },

    /// A hook executable exited unsuccessfully.
    #[error("hook exited with status {code}")]
    ExitStatus {
        /// Exit code, `-1` when terminated by a signal.
        code: i32,
    },

    /// The hook process could not be started or awaited.
    #[error("failed to run hook process: {0}")]
    Process(String),

    /// The request to a remote hook endpoint failed.
    #[error("hook request failed: {0}")]
    Transport(String),

    /// A gRPC hook service answered with a non-OK status.
    #[error("hook service returned {code}: {message}")]
    Rpc {
        /// Numeric gRPC status code.
        code: i32,
        /// Status message.
        message: String,
    },

    /// A shared library hook failed.
    #[error("plugin hook failed: {0}")]
    Plugin(String),

    /// The event could not be encoded for the backend.
    #[error("failed to encode hook payload: {0}")]
    Serialization(String),
}

impl HookError {
    /// Creates a structured rejection.
    pub fn rejected(message: impl Into<String>, status_code: u16, body: impl Into<Bytes>) -> Self {
        Self::Rejected {
            message: message.into(),
            status_code,
            body: body.into(),
        }
    }

    /// Status of a structured rejection.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Rejected { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Body of a structured rejection.
    pub fn body(&self) -> Option<&Bytes> {
        match self {
            Self::Rejected { body, .. } => Some(body),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for HookError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Error returned by a synchronous dispatch, together with whatever
/// output the backend produced before failing.
#[derive(Debug, Clone, Error)]
#[error("{error}")]
pub struct InvocationError {
    /// The backend failure.
    #[source]
    pub error: HookError,
    /// Output captured from the backend, possibly empty.
    pub output: Bytes,
}

/// Rejection of an upload creation by the `pre-create` hook.
#[derive(Debug, Clone, Error)]
pub enum PreCreateError {
    /// The hook rejected the upload with its own status and body.
    #[error("pre-create hook failed: {source}")]
    Rejected {
        /// Status forwarded to the client.
        status_code: u16,
        /// Body forwarded to the client.
        body: Bytes,
        /// Original hook error.
        #[source]
        source: HookError,
    },

    /// The hook failed without a structured rejection.
    #[error("pre-create hook failed: {source}\n{output}")]
    Failed {
        /// Captured hook output.
        output: String,
        /// Original hook error.
        #[source]
        source: HookError,
    },
}

impl PreCreateError {
    /// Status the upload pipeline should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Rejected { status_code, .. } => *status_code,
            Self::Failed { .. } => DEFAULT_REJECTION_STATUS,
        }
    }

    /// Body the upload pipeline should answer with.
    pub fn body(&self) -> Bytes {
        match self {
            Self::Rejected { body, .. } => body.clone(),
            Self::Failed { .. } => Bytes::from(self.to_string()),
        }
    }

    /// The underlying hook error.
    pub fn hook_error(&self) -> &HookError {
        match self {
            Self::Rejected { source, .. } | Self::Failed { source, .. } => source,
        }
    }
}
