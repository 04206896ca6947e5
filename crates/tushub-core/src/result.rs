//! Convenience result type alias for TusHub.

use crate::error::AppError;

/// A specialized `Result` type for TusHub operations.
pub type AppResult<T> = Result<T, AppError>;
