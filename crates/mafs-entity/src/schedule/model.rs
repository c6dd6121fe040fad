//! Notification schedule entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Schedule and bookkeeping for one notification type.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSchedule {
    /// Type key (see [`super::NotificationKind`]).
    pub notification_type: String,
    /// Cron expression, 5 or 6 fields.
    pub schedule_cron: String,
    /// IANA timezone name; host default when `None`.
    pub timezone: Option<String>,
    /// Whether the job should be armed.
    pub is_enabled: bool,
    /// Last time the job started.
    pub last_run: Option<DateTime<Utc>>,
    /// Next expected fire time.
    pub next_run: Option<DateTime<Utc>>,
    /// Last time the row changed.
    pub updated_at: DateTime<Utc>,
}

/// Administrative change to a schedule row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleUpdate {
    /// New cron expression.
    pub schedule_cron: String,
    /// New timezone (`None` clears it).
    pub timezone: Option<String>,
    /// New enabled flag.
    pub is_enabled: bool,
}
