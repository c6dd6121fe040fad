//! Job execution errors.

use thiserror::Error;

use mafs_core::error::AppError;

/// Why a firing did not complete. Logged, never propagated past the job.
#[derive(Debug, Error)]
pub enum JobExecutionError {
    /// The schedule row could not be read or written.
    #[error("schedule store unavailable: {0}")]
    Store(#[source] AppError),
    /// The notification service failed.
    #[error("notification task failed: {0}")]
    Task(#[source] AppError),
}
