//! # tushub-core
//!
//! Core crate for TusHub. Contains configuration schemas, the hook type
//! enumeration, upload lifecycle event snapshots, the stop-upload
//! capability, and the unified error system.
//!
//! This crate has **no** internal dependencies on other TusHub crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use events::{FileInfo, HookEvent, HttpRequestInfo};
pub use result::AppResult;
pub use types::{EnabledHooks, HookType};
