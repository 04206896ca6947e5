//! Core type definitions used across the TusHub workspace.

pub mod hook_type;

pub use hook_type::{EnabledHooks, HookType};
