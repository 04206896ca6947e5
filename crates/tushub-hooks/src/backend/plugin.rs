//! Shared library hooks using `libloading` (feature-gated).
//!
//! The library must export `tushub_hook_handler` (see
//! [`crate::ffi::abi`]) and may export `tushub_hook_free` to release the
//! strings of each result once they have been copied.

use std::ffi::CString;
use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::info;

use tushub_core::{AppError, AppResult, HookEvent, HookType};

use super::{HookBackend, HookOutcome};
use crate::error::HookError;
use crate::ffi::abi::{FREE_SYMBOL, FfiHookFreeFn, FfiHookHandlerFn, HANDLER_SYMBOL};
use crate::ffi::safety::{ffi_result_to_outcome, string_to_c_string};

/// Symbols resolved from a loaded hook library.
struct LoadedLibrary {
    handler: FfiHookHandlerFn,
    free: Option<FfiHookFreeFn>,
    /// Keeps the symbols above valid.
    _library: libloading::Library,
}

/// Calls into a dynamically loaded hook library.
pub struct PluginHook {
    path: PathBuf,
    library: Option<LoadedLibrary>,
}

impl PluginHook {
    /// Creates a plugin hook backend. The library is loaded by `setup`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            library: None,
        }
    }

    /// Loads the hook library at `path`.
    ///
    /// # Safety
    /// This function loads arbitrary code from a shared library.
    /// Only load trusted plugins.
    unsafe fn load(path: &Path) -> AppResult<LoadedLibrary> {
        let library = unsafe { libloading::Library::new(path) }.map_err(|e| {
            AppError::hook(format!(
                "Failed to load hook library '{}': {}",
                path.display(),
                e
            ))
        })?;

        let handler = unsafe { library.get::<FfiHookHandlerFn>(HANDLER_SYMBOL) }
            .map(|symbol| *symbol)
            .map_err(|e| {
                AppError::hook(format!(
                    "Hook library '{}' missing 'tushub_hook_handler' symbol: {}",
                    path.display(),
                    e
                ))
            })?;

        let free = unsafe { library.get::<FfiHookFreeFn>(FREE_SYMBOL) }
            .ok()
            .map(|symbol| *symbol);

        Ok(LoadedLibrary {
            handler,
            free,
            _library: library,
        })
    }
}

impl fmt::Debug for PluginHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginHook")
            .field("path", &self.path)
            .field("loaded", &self.library.is_some())
            .finish()
    }
}

#[async_trait]
impl HookBackend for PluginHook {
    fn name(&self) -> &'static str {
        "plugin"
    }

    async fn setup(&mut self) -> AppResult<()> {
        let library = unsafe { Self::load(&self.path)? };
        info!(path = %self.path.display(), "Hook library loaded");
        self.library = Some(library);
        Ok(())
    }

    async fn invoke_hook(
        &self,
        hook: HookType,
        event: &HookEvent,
        _capture_output: bool,
    ) -> HookOutcome {
        let Some(library) = &self.library else {
            return HookOutcome::failure(
                HookError::Plugin("backend used before setup".to_string()),
                0,
                Bytes::new(),
            );
        };

        let payload = match event.to_json() {
            Ok(payload) => payload,
            Err(e) => return HookOutcome::failure(e.into(), 0, Bytes::new()),
        };
        let (Some(name), Ok(payload)) = (string_to_c_string(hook.as_str()), CString::new(payload))
        else {
            return HookOutcome::failure(
                HookError::Serialization("payload contains a NUL byte".to_string()),
                0,
                Bytes::new(),
            );
        };

        let handler = library.handler;
        let free = library.free;

        // The library stays loaded for as long as `self` lives, which
        // outlasts this call.
        let result = tokio::task::spawn_blocking(move || unsafe {
            let result = handler(name.as_ptr(), payload.as_ptr());
            let outcome = ffi_result_to_outcome(&result);
            if let Some(free) = free {
                free(result);
            }
            outcome
        })
        .await;

        match result {
            Ok(outcome) => outcome,
            Err(e) => HookOutcome::failure(
                HookError::Plugin(format!("hook handler panicked: {e}")),
                0,
                Bytes::new(),
            ),
        }
    }
}
