//! FFI safety wrappers converting between FFI types and Rust types.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use bytes::Bytes;

use super::abi::FfiHookResult;
use crate::backend::HookOutcome;
use crate::error::HookError;

/// Converts a C string pointer to a Rust `String`, replacing invalid UTF-8.
///
/// Returns `None` if the pointer is null.
///
/// # Safety
/// `ptr` must be null or point to a valid null-terminated string.
pub unsafe fn c_str_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    let c_str = unsafe { CStr::from_ptr(ptr) };
    Some(c_str.to_string_lossy().into_owned())
}

/// Converts a Rust string to a `CString`.
///
/// Returns `None` if the string contains null bytes.
pub fn string_to_c_string(s: &str) -> Option<CString> {
    CString::new(s).ok()
}

/// Converts an FFI hook result to a [`HookOutcome`], copying every string.
///
/// # Safety
/// Every non-null pointer in `result` must point to a valid
/// null-terminated string.
pub unsafe fn ffi_result_to_outcome(result: &FfiHookResult) -> HookOutcome {
    let output = unsafe { c_str_to_string(result.output) }
        .map(Bytes::from)
        .unwrap_or_default();

    if result.return_code == 0 && result.status_code == 0 {
        return HookOutcome::success(output, 0);
    }

    let message = unsafe { c_str_to_string(result.message) }
        .unwrap_or_else(|| format!("hook returned {}", result.return_code));

    let error = match u16::try_from(result.status_code) {
        Ok(status_code) if status_code > 0 => {
            let body = unsafe { c_str_to_string(result.body) }
                .map(Bytes::from)
                .unwrap_or_default();
            HookError::rejected(message, status_code, body)
        }
        _ => HookError::Plugin(message),
    };

    HookOutcome::failure(error, result.return_code, output)
}
