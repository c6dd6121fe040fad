//! Manual notification runs.

use std::sync::Arc;

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use mafs_core::error::AppError;
use mafs_entity::schedule::NotificationKind;
use mafs_messaging::{LoggingPusher, MessagePusher, pusher_from_config};
use mafs_service::notification::{NotificationSummary, build_tasks};

/// Arguments for notify commands
#[derive(Debug, Args)]
pub struct NotifyArgs {
    /// Notify subcommand
    #[command(subcommand)]
    pub command: NotifyCommand,
}

/// Notify subcommands
#[derive(Debug, Subcommand)]
pub enum NotifyCommand {
    /// Run one notification job now
    Run {
        /// Notification type (`old_open_tickets`, `due_date_reminder`, `pending_tickets`)
        notification_type: String,
        /// Write messages to the log instead of sending them
        #[arg(long)]
        dry_run: bool,
    },
}

/// Summary display row for table output
#[derive(Debug, Serialize, Tabled)]
struct SummaryRow {
    /// Notification type
    #[tabled(rename = "type")]
    kind: String,
    /// Matching tickets
    candidates: usize,
    /// Addressed users
    recipients: usize,
    /// Delivered messages
    sent: usize,
    /// Rejected messages
    failed: usize,
    /// Recipients without LINE
    no_line_id: usize,
}

impl From<&NotificationSummary> for SummaryRow {
    fn from(s: &NotificationSummary) -> Self {
        Self {
            kind: s.kind.as_str().to_string(),
            candidates: s.candidates,
            recipients: s.recipients,
            sent: s.sent,
            failed: s.failed,
            no_line_id: s.skipped_no_line_id,
        }
    }
}

/// Execute notify commands
pub async fn execute(args: &NotifyArgs, env: &str, format: OutputFormat) -> Result<(), AppError> {
    match &args.command {
        NotifyCommand::Run {
            notification_type,
            dry_run,
        } => {
            let kind: NotificationKind = notification_type.parse()?;
            let config = super::load_config(env)?;
            let stores = super::open_stores(&config).await?;

            let pusher: Arc<dyn MessagePusher> = if *dry_run {
                output::print_warning("Dry run: messages go to the log only");
                Arc::new(LoggingPusher)
            } else {
                pusher_from_config(&config.line)
            };

            let task = build_tasks(&stores, pusher, &config.notifications)
                .into_iter()
                .find(|t| t.kind() == kind)
                .ok_or_else(|| AppError::internal(format!("No task registered for {kind}")))?;

            let result = task.run().await;
            stores.close().await;

            let summary = result?;
            output::print_row(&SummaryRow::from(&summary), format);
            Ok(())
        }
    }
}
