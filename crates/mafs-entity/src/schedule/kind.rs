//! Notification type keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The scheduled notification types. Each has one schedule row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Open tickets nobody has picked up.
    OldOpenTickets,
    /// Tickets due soon or overdue, per assignee.
    DueDateReminder,
    /// Tickets waiting on a specific user.
    PendingTickets,
}

impl NotificationKind {
    /// All notification types.
    pub const ALL: [NotificationKind; 3] = [
        Self::OldOpenTickets,
        Self::DueDateReminder,
        Self::PendingTickets,
    ];

    /// The type key stored in `notification_schedules.notification_type`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OldOpenTickets => "old_open_tickets",
            Self::DueDateReminder => "due_date_reminder",
            Self::PendingTickets => "pending_tickets",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = mafs_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                mafs_core::AppError::not_found(format!("Unknown notification type: '{s}'"))
            })
    }
}
