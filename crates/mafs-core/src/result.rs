//! Convenience result type alias for MAFS.

use crate::error::AppError;

/// A specialized `Result` type for MAFS operations.
pub type AppResult<T> = Result<T, AppError>;
