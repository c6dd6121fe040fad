//! Reminder about open tickets nobody has picked up.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::info;

use mafs_core::config::NotificationsConfig;
use mafs_core::result::AppResult;
use mafs_database::store::{TicketStore, UserStore};
use mafs_entity::schedule::NotificationKind;
use mafs_entity::ticket::Ticket;
use mafs_entity::user::PermissionLevel;
use mafs_messaging::MessagePusher;

use super::format::{digest, hours_since};
use super::{NotificationSummary, NotificationTask, deliver};

/// Sends every active engineer and manager the list of tickets still `open`
/// after the configured number of hours.
#[derive(Clone)]
pub struct OldOpenTicketsNotificationService {
    tickets: Arc<dyn TicketStore>,
    users: Arc<dyn UserStore>,
    pusher: Arc<dyn MessagePusher>,
    config: NotificationsConfig,
}

impl OldOpenTicketsNotificationService {
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

    /// Tickets that would be reported at `now`, oldest first.
    pub async fn candidates(&self, now: DateTime<Utc>) -> AppResult<Vec<Ticket>> {
        let threshold = now - Duration::hours(self.config.stale_open_hours);
        self.tickets.stale_open(threshold).await
    }

    fn message(&self, tickets: &[Ticket], now: DateTime<Utc>) -> String {
        let header = format!(
            "[MAFS] {} open ticket(s) waiting more than {}h",
            tickets.len(),
            self.config.stale_open_hours
        );
        digest(
            &header,
            tickets,
            self.config.max_items_per_user,
            &self.config.ticket_url_base,
            |t| {
                format!(
                    "{} {} ({}h, {})",
                    t.ticket_number,
                    t.title,
                    hours_since(t.created_at, now),
                    t.severity.as_str()
                )
            },
        )
    }
}

#[async_trait]
impl NotificationTask for OldOpenTicketsNotificationService {
    fn kind(&self) -> NotificationKind {
        NotificationKind::OldOpenTickets
    }

    async fn run(&self) -> AppResult<NotificationSummary> {
        let now = Utc::now();
        let mut summary = NotificationSummary::new(self.kind());

        let tickets = self.candidates(now).await?;
        summary.candidates = tickets.len();
        if tickets.is_empty() {
            info!(kind = %summary.kind, "No stale open tickets");
            return Ok(summary);
        }

        let text = self.message(&tickets, now);
        let recipients = self
            .users
            .list_active_at_level(PermissionLevel::Engineer.value())
            .await?;
        for user in &recipients {
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

#[cfg(test)]
mod tests {
    use mafs_messaging::RecordingPusher;

    use super::*;
    use crate::testing::ticket_at;
    use crate::testing;

    #[tokio::test]
    async fn test_ticket_open_for_25_hours_is_notified() {
        let (memory, stores) = testing::stores();
        let reporter = testing::user(&stores, "op", "OPERATOR", PermissionLevel::Operator, Some("Uop")).await;
        let eng = testing::user(&stores, "eng", "ENGINEER", PermissionLevel::Engineer, Some("Ueng")).await;
        let _mgr = testing::user(&stores, "mgr", "MANAGER", PermissionLevel::Manager, None).await;

        let now = Utc::now();
        memory
            .put_ticket(ticket_at(100, reporter.id, now - Duration::hours(25)))
            .await;
        memory
            .put_ticket(ticket_at(101, reporter.id, now - Duration::hours(2)))
            .await;

        let pusher = Arc::new(RecordingPusher::new());
        let svc = OldOpenTicketsNotificationService::new(
            Arc::clone(&stores.tickets),
            Arc::clone(&stores.users),
            pusher.clone(),
            NotificationsConfig::default(),
        );

        let ids: Vec<i64> = svc.candidates(now).await.unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![100]);

        let summary = svc.run().await.unwrap();
        assert_eq!(summary.candidates, 1);
        assert_eq!(summary.recipients, 2);
        assert_eq!(summary.sent, 1);
        assert_eq!(summary.skipped_no_line_id, 1);

        let sent = pusher.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, eng.line_id.clone().unwrap());
        assert!(sent[0].1.contains("AB-20260101-0100"));
        assert!(!sent[0].1.contains("AB-20260101-0101"));
    }

    #[tokio::test]
    async fn test_nothing_stale_sends_nothing() {
        let (_, stores) = testing::stores();
        testing::user(&stores, "eng", "ENGINEER", PermissionLevel::Engineer, Some("Ueng")).await;
        let pusher = Arc::new(RecordingPusher::new());
        let summary = OldOpenTicketsNotificationService::new(
            Arc::clone(&stores.tickets),
            Arc::clone(&stores.users),
            pusher.clone(),
            NotificationsConfig::default(),
        )
        .run()
        .await
        .unwrap();
        assert_eq!(summary.sent, 0);
        assert!(pusher.sent().await.is_empty());
    }
}
