//! Per-assignee reminder about tickets due soon or overdue.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use mafs_core::config::NotificationsConfig;
use mafs_core::result::AppResult;
use mafs_database::store::{TicketStore, UserStore};
use mafs_entity::schedule::NotificationKind;
use mafs_entity::ticket::Ticket;
use mafs_messaging::MessagePusher;

use super::format::digest;
use super::{NotificationSummary, NotificationTask, deliver};

/// Reminds each assignee of their unfinished tickets due within the
/// configured window, most overdue first.
#[derive(Clone)]
pub struct DueDateNotificationService {
    tickets: Arc<dyn TicketStore>,
    users: Arc<dyn UserStore>,
    pusher: Arc<dyn MessagePusher>,
    config: NotificationsConfig,
}

impl DueDateNotificationService {
    pub fn new(
        tickets: Arc<dyn TicketStore>,
        users: Arc<dyn UserStore>,
        pusher: Arc<dyn MessagePusher>,
        config: NotificationsConfig,
    ) -> Self {
        Self {
            tickets,
            users,
            pusher,
            config,
        }
    }

    /// Candidate tickets grouped by assignee, each group earliest due first.
    pub async fn by_assignee(&self, now: DateTime<Utc>) -> AppResult<BTreeMap<i64, Vec<Ticket>>> {
        let due_before = now + Duration::days(self.config.due_window_days);
        let mut groups: BTreeMap<i64, Vec<Ticket>> = BTreeMap::new();
        for ticket in self.tickets.due_before(due_before).await? {
            if let Some(assignee) = ticket.assigned_to {
                groups.entry(assignee).or_default().push(ticket);
            }
        }
        Ok(groups)
    }

    fn message(&self, tickets: &[Ticket], now: DateTime<Utc>) -> String {
        let overdue = tickets.iter().filter(|t| t.is_overdue(now)).count();
        let header = format!(
            "[MAFS] Due date reminder: {} ticket(s), {} overdue",
            tickets.len(),
            overdue
        );
        digest(
            &header,
            tickets,
            self.config.max_items_per_user,
            &self.config.ticket_url_base,
            |t| {
                let due = t
                    .due_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default();
                let flag = if t.is_overdue(now) { "[OVERDUE] " } else { "" };
                format!("{flag}{} {} (due {due})", t.ticket_number, t.title)
            },
        )
    }
}

#[async_trait]
impl NotificationTask for DueDateNotificationService {
    fn kind(&self) -> NotificationKind {
        NotificationKind::DueDateReminder
    }

    async fn run(&self) -> AppResult<NotificationSummary> {
        let now = Utc::now();
        let mut summary = NotificationSummary::new(self.kind());

        let groups = self.by_assignee(now).await?;
        summary.candidates = groups.values().map(Vec::len).sum();
        if groups.is_empty() {
            info!(kind = %summary.kind, "No tickets due");
            return Ok(summary);
        }

        let ids: Vec<i64> = groups.keys().copied().collect();
        let users: HashMap<i64, _> = self
            .users
            .find_many(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        for (assignee, tickets) in &groups {
            let Some(user) = users.get(assignee).filter(|u| u.is_active) else {
                debug!(assignee, "Assignee missing or inactive, skipping");
                continue;
            };
            let text = self.message(tickets, now);
            deliver(self.pusher.as_ref(), &mut summary, user, &text).await;
        }

        info!(
            kind = %summary.kind,
            candidates = summary.candidates,
            recipients = summary.recipients,
            sent = summary.sent,
            failed = summary.failed,
            skipped = summary.skipped_no_line_id,
            "Notification run finished"
        );
        Ok(summary)
    }
}
