//! FFI ABI definitions for shared library hooks.
//!
//! Defines the C-compatible interface a hook library must export.

use std::os::raw::c_char;

/// Name of the required handler symbol.
pub const HANDLER_SYMBOL: &[u8] = b"tushub_hook_handler";

/// Name of the optional symbol releasing a returned [`FfiHookResult`].
pub const FREE_SYMBOL: &[u8] = b"tushub_hook_free";

/// FFI-safe hook result.
///
/// String pointers are null-terminated and may be NULL. They must stay
/// valid until `tushub_hook_free` is called or, when the library does not
/// export it, for the life of the library.
#[repr(C)]
pub struct FfiHookResult {
    /// Return code, `0` for success.
    pub return_code: i32,
    /// HTTP-style status of a structured rejection, `0` for none.
    pub status_code: i32,
    /// Error message (NULL on success).
    pub message: *const c_char,
    /// Rejection body returned to the client (NULL if none).
    pub body: *const c_char,
    /// Hook output (NULL if none).
    pub output: *const c_char,
}

/// Type signature for the hook handler.
///
/// ```c
/// extern FfiHookResult tushub_hook_handler(const char* hook_name, const char* payload_json);
/// ```
pub type FfiHookHandlerFn =
    unsafe extern "C" fn(hook_name: *const c_char, payload_json: *const c_char) -> FfiHookResult;

/// Type signature for releasing a result returned by the handler.
pub type FfiHookFreeFn = unsafe extern "C" fn(result: FfiHookResult);
