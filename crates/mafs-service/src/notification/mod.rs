//! Scheduled notification services.
//!
//! Each service implements [`NotificationTask`]; the worker crate drives
//! them on their cron schedules and the CLI can run them by hand.

pub mod due_date;
pub mod format;
pub mod old_open;
pub mod pending;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use mafs_core::config::NotificationsConfig;
use mafs_core::result::AppResult;
use mafs_database::Stores;
use mafs_entity::schedule::NotificationKind;
use mafs_entity::user::User;
use mafs_messaging::MessagePusher;

pub use due_date::DueDateNotificationService;
pub use old_open::OldOpenTicketsNotificationService;
pub use pending::PendingTicketsNotificationService;

/// Outcome of one notification run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSummary {
    /// Which notification ran.
    pub kind: NotificationKind,
    /// Tickets that matched the query.
    pub candidates: usize,
    /// Users a message was addressed to.
    pub recipients: usize,
    /// Messages accepted by the pusher.
    pub sent: usize,
    /// Messages the pusher rejected.
    pub failed: usize,
    /// Recipients without a linked LINE account.
    pub skipped_no_line_id: usize,
}

impl NotificationSummary {
    /// An empty summary for `kind`.
    pub fn new(kind: NotificationKind) -> Self {
        Self {
            kind,
            candidates: 0,
            recipients: 0,
            sent: 0,
            failed: 0,
            skipped_no_line_id: 0,
        }
    }
}

/// A notification the scheduler can fire.
#[async_trait]
pub trait NotificationTask: Send + Sync + 'static {
    /// The schedule row this task belongs to.
    fn kind(&self) -> NotificationKind;

    /// Queries tickets, sends the messages and reports what happened.
    async fn run(&self) -> AppResult<NotificationSummary>;
}

/// Builds the three notification tasks over shared stores and pusher.
pub fn build_tasks(
    stores: &Stores,
    pusher: Arc<dyn MessagePusher>,
    config: &NotificationsConfig,
) -> Vec<Arc<dyn NotificationTask>> {
    vec![
        Arc::new(OldOpenTicketsNotificationService::new(
            Arc::clone(&stores.tickets),
            Arc::clone(&stores.users),
            Arc::clone(&pusher),
            config.clone(),
        )),
        Arc::new(DueDateNotificationService::new(
            Arc::clone(&stores.tickets),
            Arc::clone(&stores.users),
            Arc::clone(&pusher),
            config.clone(),
        )),
        Arc::new(PendingTicketsNotificationService::new(
            Arc::clone(&stores.tickets),
            Arc::clone(&stores.users),
            pusher,
            config.clone(),
        )),
    ]
}

/// Sends one message to `user`, counting the outcome in `summary`.
pub(crate) async fn deliver(
    pusher: &dyn MessagePusher,
    summary: &mut NotificationSummary,
    user: &User,
    text: &str,
) {
    summary.recipients += 1;
    let Some(line_id) = user.line_id.as_deref().filter(|id| !id.is_empty()) else {
        summary.skipped_no_line_id += 1;
        debug!(user_id = user.id, kind = %summary.kind, "Recipient has no LINE id");
        return;
    };

    match pusher.push_text(line_id, text).await {
        Ok(()) => summary.sent += 1,
        Err(e) => {
            summary.failed += 1;
            warn!(user_id = user.id, kind = %summary.kind, error = %e, "Notification push failed");
        }
    }
}
