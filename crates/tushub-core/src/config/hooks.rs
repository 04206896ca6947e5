//! Hook dispatch and backend configuration.

use serde::{Deserialize, Serialize};

use crate::types::EnabledHooks;

/// Hook dispatch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HooksConfig {
    /// Hook types that will be dispatched. Defaults to all of them.
    #[serde(default)]
    pub enabled_hooks: EnabledHooks,
    /// Return code that makes a `post-receive` hook stop the upload.
    /// `0` disables the feature.
    #[serde(default)]
    pub stop_upload_code: i32,
    /// Log the start and successful finish of every invocation.
    #[serde(default = "default_true")]
    pub verbose: bool,
    /// Backend used to execute hooks.
    #[serde(default)]
    pub backend: BackendConfig,
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            enabled_hooks: EnabledHooks::default(),
            stop_upload_code: 0,
            verbose: true,
            backend: BackendConfig::default(),
        }
    }
}

/// Which backend executes hooks, selected once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// No backend; hooks only produce their built-in side effects.
    #[default]
    None,
    /// Run executables from a directory.
    File(FileHookConfig),
    /// POST to an HTTP endpoint.
    Http(HttpHookConfig),
    /// Call a gRPC hook service.
    Grpc(GrpcHookConfig),
    /// Call into a dynamically loaded shared library.
    Plugin(PluginHookConfig),
}

/// Executable hooks configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHookConfig {
    /// Directory containing one executable per hook name.
    pub directory: String,
}

/// HTTP webhook configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpHookConfig {
    /// Endpoint receiving the POST requests.
    pub endpoint: String,
    /// Additional attempts after a failed request.
    #[serde(default = "default_http_retries")]
    pub max_retries: u32,
    /// Seconds to wait between attempts.
    #[serde(default = "default_backoff")]
    pub backoff_seconds: u64,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: u64,
}

/// gRPC hook service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrpcHookConfig {
    /// Endpoint URI, e.g. `http://127.0.0.1:9000`.
    pub endpoint: String,
    /// Additional attempts after a failed call.
    #[serde(default = "default_grpc_retries")]
    pub max_retries: u32,
    /// Seconds to wait between attempts.
    #[serde(default = "default_backoff")]
    pub backoff_seconds: u64,
}

/// Shared library hook configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginHookConfig {
    /// Path to the `.so` / `.dylib` / `.dll`.
    pub path: String,
}

impl BackendConfig {
    /// Human readable target of the backend, used in startup logs.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::File(c) => Some(&c.directory),
            Self::Http(c) => Some(&c.endpoint),
            Self::Grpc(c) => Some(&c.endpoint),
            Self::Plugin(c) => Some(&c.path),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_http_retries() -> u32 {
    3
}

fn default_grpc_retries() -> u32 {
    5
}

fn default_backoff() -> u64 {
    1
}

fn default_request_timeout() -> u64 {
    30
}
