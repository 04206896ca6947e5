//! Core traits defined in `tushub-core` and implemented by other crates.

pub mod stop;

pub use stop::StopUpload;
