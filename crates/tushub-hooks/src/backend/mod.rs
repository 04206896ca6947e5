//! Hook backends.
//!
//! A backend executes a single hook invocation and reports its output,
//! return code, and error. Exactly one backend is selected at startup
//! from [`BackendConfig`].

pub mod file;
#[cfg(feature = "grpc")]
pub mod grpc;
pub mod http;
#[cfg(feature = "dynamic")]
pub mod plugin;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use tushub_core::config::BackendConfig;
use tushub_core::{AppError, AppResult, HookEvent, HookType};

use crate::error::HookError;

pub use file::FileHook;
pub use http::HttpHook;

#[cfg(feature = "grpc")]
pub use grpc::GrpcHook;
#[cfg(feature = "dynamic")]
pub use plugin::PluginHook;

/// Result of one backend invocation.
#[derive(Debug, Clone, Default)]
pub struct HookOutcome {
    /// Output produced by the hook, possibly empty.
    pub output: Bytes,
    /// Backend specific return code. Exit code for executables, HTTP
    /// status for webhooks, `0` when the backend has no notion of it.
    pub return_code: i32,
    /// Set when the invocation failed.
    pub error: Option<HookError>,
}

impl HookOutcome {
    /// Successful invocation.
    pub fn success(output: impl Into<Bytes>, return_code: i32) -> Self {
        Self {
            output: output.into(),
            return_code,
            error: None,
        }
    }

    /// Failed invocation.
    pub fn failure(error: HookError, return_code: i32, output: impl Into<Bytes>) -> Self {
        Self {
            output: output.into(),
            return_code,
            error: Some(error),
        }
    }

    /// Whether the invocation succeeded.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// A hook execution backend.
///
/// `setup` runs once before any invocation; afterwards the backend is
/// shared read-only and must tolerate concurrent `invoke_hook` calls.
#[async_trait]
pub trait HookBackend: Send + Sync + fmt::Debug {
    /// Short backend identifier used in logs.
    fn name(&self) -> &'static str;

    /// Validate configuration and initialize connections.
    async fn setup(&mut self) -> AppResult<()>;

    /// Execute `hook` for `event`.
    ///
    /// `capture_output` asks the backend to collect the hook's output
    /// instead of forwarding it.
    async fn invoke_hook(
        &self,
        hook: HookType,
        event: &HookEvent,
        capture_output: bool,
    ) -> HookOutcome;
}

/// Builds the backend selected by `config`, or `None` when hooks are off.
///
/// Backends compiled out of this build are a configuration error.
pub fn from_config(config: &BackendConfig) -> AppResult<Option<Box<dyn HookBackend>>> {
    let backend: Box<dyn HookBackend> = match config {
        BackendConfig::None => return Ok(None),
        BackendConfig::File(file) => Box::new(FileHook::new(&file.directory)),
        BackendConfig::Http(http) => Box::new(HttpHook::new(
            &http.endpoint,
            http.max_retries,
            Duration::from_secs(http.backoff_seconds),
            Duration::from_secs(http.timeout_seconds),
        )),
        #[cfg(feature = "grpc")]
        BackendConfig::Grpc(grpc) => Box::new(GrpcHook::new(
            &grpc.endpoint,
            grpc.max_retries,
            Duration::from_secs(grpc.backoff_seconds),
        )),
        #[cfg(not(feature = "grpc"))]
        BackendConfig::Grpc(_) => {
            return Err(AppError::not_implemented(
                "gRPC hooks require building with the `grpc` feature",
            ));
        }
        #[cfg(feature = "dynamic")]
        BackendConfig::Plugin(plugin) => Box::new(PluginHook::new(&plugin.path)),
        #[cfg(not(feature = "dynamic"))]
        BackendConfig::Plugin(_) => {
            return Err(AppError::not_implemented(
                "Plugin hooks require building with the `dynamic` feature",
            ));
        }
    };

    Ok(Some(backend))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tushub_core::config::{FileHookConfig, HttpHookConfig};

    #[test]
    fn test_none_selects_no_backend() {
        assert!(from_config(&BackendConfig::None).expect("config").is_none());
    }

    #[test]
    fn test_backend_names() {
        let file = from_config(&BackendConfig::File(FileHookConfig {
            directory: "/tmp/hooks".to_string(),
        }))
        .expect("config")
        .expect("backend");
        assert_eq!(file.name(), "file");

        let http = from_config(&BackendConfig::Http(HttpHookConfig {
            endpoint: "http://localhost:8081/hooks".to_string(),
            max_retries: 3,
            backoff_seconds: 1,
            timeout_seconds: 30,
        }))
        .expect("config")
        .expect("backend");
        assert_eq!(http.name(), "http");
    }

    #[cfg(not(feature = "grpc"))]
    #[test]
    fn test_grpc_without_feature_is_rejected() {
        let config = BackendConfig::Grpc(tushub_core::config::GrpcHookConfig {
            endpoint: "http://127.0.0.1:9000".to_string(),
            max_retries: 5,
            backoff_seconds: 1,
        });
        let err = from_config(&config).expect_err("must fail");
        assert_eq!(err.kind, tushub_core::error::ErrorKind::NotImplemented);
    }

    #[test]
    fn test_outcome_constructors() {
        assert!(HookOutcome::success("ok", 0).is_success());
        let failed = HookOutcome::failure(HookError::ExitStatus { code: 3 }, 3, "");
        assert!(!failed.is_success());
        assert_eq!(failed.return_code, 3);
    }
}
