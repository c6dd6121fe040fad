//! Notification schedule inspection.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use mafs_core::error::AppError;
use mafs_entity::schedule::NotificationSchedule;

/// Arguments for schedule commands
#[derive(Debug, Args)]
pub struct ScheduleArgs {
    /// Schedule subcommand
    #[command(subcommand)]
    pub command: ScheduleCommand,
}

/// Schedule subcommands
#[derive(Debug, Subcommand)]
pub enum ScheduleCommand {
    /// List the notification schedule rows
    List,
}

/// Schedule display row for table output
#[derive(Debug, Serialize, Tabled)]
struct ScheduleRow {
    /// Notification type
    #[tabled(rename = "type")]
    notification_type: String,
    /// Cron expression
    cron: String,
    /// Timezone
    timezone: String,
    /// Enabled flag
    enabled: bool,
    /// Last start
    last_run: String,
    /// Next planned start
    next_run: String,
}

impl From<NotificationSchedule> for ScheduleRow {
    fn from(s: NotificationSchedule) -> Self {
        let stamp = |t: Option<chrono::DateTime<chrono::Utc>>| {
            t.map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
                .unwrap_or_else(|| "-".to_string())
        };
        Self {
            notification_type: s.notification_type,
            cron: s.schedule_cron,
            timezone: s.timezone.unwrap_or_else(|| "UTC".to_string()),
            enabled: s.is_enabled,
            last_run: stamp(s.last_run),
            next_run: stamp(s.next_run),
        }
    }
}

/// Execute schedule commands
pub async fn execute(
    args: &ScheduleArgs,
    env: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(env)?;
    let stores = super::open_stores(&config).await?;

    let result = match &args.command {
        ScheduleCommand::List => stores.schedules.list().await.map(|rows| {
            let rows: Vec<ScheduleRow> = rows.into_iter().map(ScheduleRow::from).collect();
            output::print_list(&rows, format);
        }),
    };

    stores.close().await;
    result
}
