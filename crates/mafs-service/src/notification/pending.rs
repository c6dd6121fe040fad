//! Reminder about tickets waiting on a specific person.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use mafs_core::config::NotificationsConfig;
use mafs_core::result::AppResult;
use mafs_database::store::{TicketStore, UserStore};
use mafs_entity::schedule::NotificationKind;
use mafs_entity::ticket::Ticket;
use mafs_entity::user::{PermissionLevel, User};
use mafs_messaging::MessagePusher;

use super::format::{digest, hours_since};
use super::{NotificationSummary, NotificationTask, deliver};

/// Tells each user which tickets are waiting on them.
///
/// Tickets in progress go to their assignee. Escalated tickets and
/// rejections awaiting review go to the escalation target, or to every
/// active manager when no target is set.
#[derive(Clone)]
pub struct PendingTicketsNotificationService {
    tickets: Arc<dyn TicketStore>,
    users: Arc<dyn UserStore>,
    pusher: Arc<dyn MessagePusher>,
    config: NotificationsConfig,
}

impl PendingTicketsNotificationService {
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

    /// Pending tickets keyed by the user they wait on, plus the users
    /// involved.
    pub async fn by_recipient(&self) -> AppResult<(BTreeMap<i64, Vec<Ticket>>, HashMap<i64, User>)> {
        let pending = self.tickets.pending().await?;
        let mut groups: BTreeMap<i64, Vec<Ticket>> = BTreeMap::new();
        let mut managers: Option<Vec<User>> = None;
        let mut known: HashMap<i64, User> = HashMap::new();

        for ticket in pending {
            if ticket.status.awaits_assignee() {
                if let Some(assignee) = ticket.assigned_to {
                    groups.entry(assignee).or_default().push(ticket);
                }
            } else if ticket.status.awaits_manager() {
                match ticket.escalated_to {
                    Some(target) => groups.entry(target).or_default().push(ticket),
                    None => {
                        if managers.is_none() {
                            managers = Some(
                                self.users
                                    .list_active_at_level(PermissionLevel::Manager.value())
                                    .await?,
                            );
                        }
                        for manager in managers.iter().flatten() {
                            known.insert(manager.id, manager.clone());
                            groups.entry(manager.id).or_default().push(ticket.clone());
                        }
                    }
                }
            }
        }

        let missing: Vec<i64> = groups.keys().filter(|id| !known.contains_key(id)).copied().collect();
        if !missing.is_empty() {
            for user in self.users.find_many(&missing).await? {
                known.insert(user.id, user);
            }
        }

        Ok((groups, known))
    }
}

#[async_trait]
impl NotificationTask for PendingTicketsNotificationService {
    fn kind(&self) -> NotificationKind {
        NotificationKind::PendingTickets
    }

    async fn run(&self) -> AppResult<NotificationSummary> {
        let now = Utc::now();
        let mut summary = NotificationSummary::new(self.kind());

        let (groups, users) = self.by_recipient().await?;
        let mut distinct: Vec<i64> = groups.values().flatten().map(|t| t.id).collect();
        distinct.sort_unstable();
        distinct.dedup();
        summary.candidates = distinct.len();

        for (user_id, tickets) in &groups {
            let Some(user) = users.get(user_id).filter(|u| u.is_active) else {
                debug!(user_id, "Pending-ticket recipient missing or inactive, skipping");
                continue;
            };
            let header = format!("[MAFS] {} ticket(s) waiting for you", tickets.len());
            let text = digest(
                &header,
                tickets,
                self.config.max_items_per_user,
                &self.config.ticket_url_base,
                |t| {
                    format!(
                        "{} {} ({}, {}h)",
                        t.ticket_number,
                        t.title,
                        t.status,
                        hours_since(t.updated_at, now)
                    )
                },
            );
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
    use chrono::Duration;
    use mafs_entity::ticket::TicketStatus;
    use mafs_messaging::RecordingPusher;

    use super::*;
    use crate::testing::{self, ticket_at};

    #[tokio::test]
    async fn test_routes_to_assignee_target_or_all_managers() {
        let (memory, stores) = testing::stores();
        let op = testing::user(&stores, "op", "OPERATOR", PermissionLevel::Operator, None).await;
        let eng = testing::user(&stores, "eng", "ENGINEER", PermissionLevel::Engineer, Some("Ueng")).await;
        let m1 = testing::user(&stores, "m1", "MANAGER", PermissionLevel::Manager, Some("Um1")).await;
        let m2 = testing::user(&stores, "m2", "MANAGER", PermissionLevel::Manager, Some("Um2")).await;

        let then = Utc::now() - Duration::hours(3);
        let mut in_progress = ticket_at(30, op.id, then);
        in_progress.status = TicketStatus::InProgress;
        in_progress.assigned_to = Some(eng.id);

        let mut escalated = ticket_at(31, op.id, then);
        escalated.status = TicketStatus::Escalated;
        escalated.escalated_to = Some(m1.id);

        let mut review = ticket_at(32, op.id, then);
        review.status = TicketStatus::RejectedPendingL3Review;

        let open = ticket_at(33, op.id, then);

        for t in [in_progress, escalated, review, open] {
            memory.put_ticket(t).await;
        }

        let pusher = Arc::new(RecordingPusher::new());
        let svc = PendingTicketsNotificationService::new(
            Arc::clone(&stores.tickets),
            Arc::clone(&stores.users),
            pusher.clone(),
            NotificationsConfig::default(),
        );

        let (groups, _) = svc.by_recipient().await.unwrap();
        let ids = |uid: i64| groups[&uid].iter().map(|t| t.id).collect::<Vec<_>>();
        assert_eq!(ids(eng.id), vec![30]);
        assert_eq!(ids(m1.id), vec![31, 32]);
        assert_eq!(ids(m2.id), vec![32]);

        let summary = svc.run().await.unwrap();
        assert_eq!(summary.candidates, 3);
        assert_eq!(summary.recipients, 3);
        assert_eq!(summary.sent, 3);
        assert_eq!(pusher.sent().await.len(), 3);
    }
}
