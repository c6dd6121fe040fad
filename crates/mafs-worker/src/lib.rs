//! # mafs-worker
//!
//! Cron-driven notification jobs. One [`ScheduledNotificationJob`] exists per
//! notification type; its timer is armed from the type's schedule row and
//! re-armed whenever an administrator edits that row.

pub mod cron;
pub mod error;
pub mod job;
pub mod scheduler;

pub use error::JobExecutionError;
pub use job::{ArmState, JobStatus, LastRun, RunOutcome, ScheduledNotificationJob};
pub use scheduler::NotificationScheduler;
