//! PostgreSQL implementations of the store traits.

pub mod dashboard;
pub mod hierarchy;
pub mod permission;
pub mod schedule;
pub mod ticket;
pub mod user;

pub use hierarchy::HierarchyRepository;
pub use permission::PermissionRepository;
pub use schedule::ScheduleRepository;
pub use ticket::TicketRepository;
pub use user::UserRepository;

use mafs_core::error::{AppError, ErrorKind};

/// Map a sqlx error to a conflict when it is a unique violation, otherwise
/// to a database error with `context`.
pub(crate) fn map_write_error(err: sqlx::Error, conflict: &str, context: &str) -> AppError {
    let unique = err
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());
    if unique {
        AppError::conflict(conflict.to_string())
    } else {
        AppError::with_source(ErrorKind::Database, context.to_string(), err)
    }
}

/// Escape `%` and `_` for use inside an `ILIKE` pattern.
pub(crate) fn like_pattern(search: &str) -> String {
    let escaped = search
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
