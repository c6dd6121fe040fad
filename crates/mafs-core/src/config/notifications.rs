//! Scheduled notification configuration.
//!
//! Cron expressions and enablement per notification type live in the
//! `notification_schedules` table; this section only holds the global switch
//! and the query thresholds.

use serde::{Deserialize, Serialize};

/// Global settings for the scheduled notification jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Start the scheduler at boot.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Age in hours after which an open ticket counts as stale.
    #[serde(default = "default_stale_open_hours")]
    pub stale_open_hours: i64,
    /// Days ahead of the due date at which reminders start.
    #[serde(default = "default_due_window_days")]
    pub due_window_days: i64,
    /// Maximum tickets listed in one message.
    #[serde(default = "default_max_items")]
    pub max_items_per_user: usize,
    /// Base for ticket links, the ticket id is appended.
    #[serde(default = "default_ticket_url_base")]
    pub ticket_url_base: String,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stale_open_hours: default_stale_open_hours(),
            due_window_days: default_due_window_days(),
            max_items_per_user: default_max_items(),
            ticket_url_base: default_ticket_url_base(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_stale_open_hours() -> i64 {
    24
}

fn default_due_window_days() -> i64 {
    3
}

fn default_max_items() -> usize {
    10
}

fn default_ticket_url_base() -> String {
    "http://localhost:3000/tickets/".to_string()
}
