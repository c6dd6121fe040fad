//! In-process store backend.
//!
//! [`MemoryStore`] implements every store trait over one shared map set,
//! so cross-aggregate reads (dashboard joins, reporter names) behave like
//! the relational backend. Nothing is persisted.

mod hierarchy;
mod schedules;
mod tickets;
mod users;

use std::collections::BTreeMap;

use chrono::Utc;
use tokio::sync::RwLock;

use mafs_entity::hierarchy::{Area, Line, Machine, Plant, ProductionUnit};
use mafs_entity::permission::{FormPermission, forms};
use mafs_entity::schedule::{NotificationKind, NotificationSchedule};
use mafs_entity::ticket::{Ticket, TicketAttachment, TicketComment, TicketHistory};
use mafs_entity::user::User;

#[derive(Debug, Default)]
pub(crate) struct MemoryData {
    next_id: i64,
    pub(crate) users: BTreeMap<i64, User>,
    pub(crate) permissions: Vec<FormPermission>,
    pub(crate) tickets: BTreeMap<i64, Ticket>,
    pub(crate) history: Vec<TicketHistory>,
    pub(crate) comments: Vec<TicketComment>,
    pub(crate) attachments: BTreeMap<i64, TicketAttachment>,
    pub(crate) plants: Vec<Plant>,
    pub(crate) areas: Vec<Area>,
    pub(crate) lines: Vec<Line>,
    pub(crate) machines: Vec<Machine>,
    pub(crate) units: BTreeMap<i64, ProductionUnit>,
    pub(crate) schedules: BTreeMap<String, NotificationSchedule>,
}

impl MemoryData {
    pub(crate) fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Store backend holding all data in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub(crate) data: RwLock<MemoryData>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store with the default schedules, form permissions and a small
    /// plant hierarchy, matching the seed migration.
    pub fn with_reference_data() -> Self {
        let mut data = MemoryData::default();
        let now = Utc::now();

        let crons = [
            (NotificationKind::OldOpenTickets, "0 9 * * *"),
            (NotificationKind::DueDateReminder, "0 8 * * *"),
            (NotificationKind::PendingTickets, "0 10 * * 1-5"),
        ];
        for (kind, cron) in crons {
            data.schedules.insert(
                kind.as_str().to_string(),
                NotificationSchedule {
                    notification_type: kind.as_str().to_string(),
                    schedule_cron: cron.to_string(),
                    timezone: Some("Asia/Bangkok".to_string()),
                    is_enabled: true,
                    last_run: None,
                    next_run: None,
                    updated_at: now,
                },
            );
        }

        let grants: [(&str, &str, [bool; 4]); 9] = [
            ("MANAGER", forms::TICKETS, [true, true, true, true]),
            ("MANAGER", forms::DASHBOARD, [true, false, false, false]),
            ("MANAGER", forms::HIERARCHY, [true, true, true, false]),
            ("MANAGER", forms::USERS, [true, false, false, false]),
            ("ENGINEER", forms::TICKETS, [true, true, true, false]),
            ("ENGINEER", forms::DASHBOARD, [true, false, false, false]),
            ("ENGINEER", forms::HIERARCHY, [true, false, false, false]),
            ("OPERATOR", forms::TICKETS, [true, true, false, false]),
            ("OPERATOR", forms::HIERARCHY, [true, false, false, false]),
        ];
        for (group, form, [view, create, update, delete]) in grants {
            data.permissions.push(FormPermission {
                group_code: group.to_string(),
                form_code: form.to_string(),
                can_view: view,
                can_create: create,
                can_update: update,
                can_delete: delete,
            });
        }

        let plant_id = data.next_id();
        data.plants.push(Plant {
            id: plant_id,
            code: "MT1".into(),
            name: "Main Plant".into(),
        });
        let area_id = data.next_id();
        data.areas.push(Area {
            id: area_id,
            plant_id,
            code: "PRESS".into(),
            name: "Press Shop".into(),
        });
        let line_id = data.next_id();
        data.lines.push(Line {
            id: line_id,
            area_id,
            code: "L01".into(),
            name: "Line 1".into(),
        });
        let machine_id = data.next_id();
        data.machines.push(Machine {
            id: machine_id,
            line_id,
            code: "M01".into(),
            name: "Press 1".into(),
        });
        let unit_id = data.next_id();
        data.units.insert(
            unit_id,
            ProductionUnit {
                id: unit_id,
                pucode: "MT1-PRESS-L01-M01".into(),
                plant: "MT1".into(),
                area: "PRESS".into(),
                line: "L01".into(),
                machine: "M01".into(),
                name: "Press 1".into(),
                is_active: true,
            },
        );

        Self {
            data: RwLock::new(data),
        }
    }

    /// Insert or overwrite a ticket row as-is (seeding and tests).
    pub async fn put_ticket(&self, ticket: Ticket) {
        let mut data = self.data.write().await;
        data.next_id = data.next_id.max(ticket.id);
        data.tickets.insert(ticket.id, ticket);
    }

    /// Insert or overwrite a schedule row as-is (seeding and tests).
    pub async fn put_schedule(&self, schedule: NotificationSchedule) {
        self.data
            .write()
            .await
            .schedules
            .insert(schedule.notification_type.clone(), schedule);
    }

    /// Remove a schedule row (tests).
    pub async fn remove_schedule(&self, notification_type: &str) {
        self.data.write().await.schedules.remove(notification_type);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;
    use mafs_core::error::ErrorKind;
    use mafs_core::types::PageRequest;
    use mafs_entity::dashboard::DashboardFilter;
    use mafs_entity::ticket::{NewTicket, Priority, Severity, TicketFilter, TicketStatus};
    use mafs_entity::user::{CreateUser, PermissionLevel};

    use super::*;
    use crate::store::{ScheduleStore, TicketStore, UserStore};

    fn new_user(username: &str, person_no: &str) -> CreateUser {
        CreateUser {
            person_no: person_no.into(),
            username: username.into(),
            display_name: username.to_uppercase(),
            email: None,
            department: None,
            group_code: "OPERATOR".into(),
            permission_level: PermissionLevel::Operator,
            password_hash: "hash".into(),
        }
    }

    fn new_ticket(created_by: i64, title: &str) -> NewTicket {
        NewTicket {
            title: title.into(),
            description: String::new(),
            pu_id: None,
            severity: Severity::Medium,
            priority: Priority::Normal,
            created_by,
            due_date: None,
        }
    }

    #[tokio::test]
    async fn test_ticket_numbers_increase_per_day() {
        let store: Arc<dyn TicketStore> = Arc::new(MemoryStore::new());
        let first = store.create(new_ticket(1, "a")).await.unwrap();
        let second = store.create(new_ticket(1, "b")).await.unwrap();

        assert!(first.ticket_number.ends_with("-0001"));
        assert!(second.ticket_number.ends_with("-0002"));
        assert_eq!(store.history(first.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let store: Arc<dyn UserStore> = Arc::new(MemoryStore::new());
        store.create(new_user("somchai", "P001")).await.unwrap();
        let err = store.create(new_user("SOMCHAI", "P002")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);

        let by_person_no = store.find_by_login("P001").await.unwrap();
        assert_eq!(by_person_no.map(|u| u.username).as_deref(), Some("somchai"));
    }

    #[tokio::test]
    async fn test_stale_open_oldest_first() {
        let memory = Arc::new(MemoryStore::new());
        let store: Arc<dyn TicketStore> = memory.clone();
        let now = Utc::now();

        let recent = store.create(new_ticket(1, "recent")).await.unwrap();
        let mut old = store.create(new_ticket(1, "old")).await.unwrap();
        let mut older = store.create(new_ticket(1, "older")).await.unwrap();
        old.created_at = now - Duration::hours(25);
        older.created_at = now - Duration::hours(48);
        memory.put_ticket(old.clone()).await;
        memory.put_ticket(older.clone()).await;

        let stale = store.stale_open(now - Duration::hours(24)).await.unwrap();
        let ids: Vec<i64> = stale.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![older.id, old.id]);
        assert!(!ids.contains(&recent.id));
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let store: Arc<dyn TicketStore> = Arc::new(MemoryStore::new());
        let open = store.create(new_ticket(1, "a")).await.unwrap();
        let other = store.create(new_ticket(1, "b")).await.unwrap();
        store
            .update(
                other.id,
                mafs_entity::ticket::TicketPatch {
                    status: Some(TicketStatus::Closed),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let filter = TicketFilter {
            status: Some(TicketStatus::Open),
            ..Default::default()
        };
        let page = store.list(&filter, &PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, open.id);
    }

    #[tokio::test]
    async fn test_summary_counts_open_and_overdue() {
        let memory = Arc::new(MemoryStore::new());
        let store: Arc<dyn TicketStore> = memory.clone();
        let now = Utc::now();

        let mut late = store.create(new_ticket(1, "late")).await.unwrap();
        late.due_date = Some(now - Duration::hours(2));
        late.downtime_hours = Some(1.5);
        memory.put_ticket(late).await;
        let done = store.create(new_ticket(1, "done")).await.unwrap();
        store
            .update(
                done.id,
                mafs_entity::ticket::TicketPatch {
                    status: Some(TicketStatus::Closed),
                    downtime_hours: Some(2.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let summary = store.summary(&DashboardFilter::default(), now).await.unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.open, 1);
        assert_eq!(summary.overdue, 1);
        assert!((summary.total_downtime_hours - 3.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_reference_data_has_all_schedules() {
        let store: Arc<dyn ScheduleStore> = Arc::new(MemoryStore::with_reference_data());
        for kind in NotificationKind::ALL {
            assert!(store.get(kind.as_str()).await.unwrap().is_some());
        }
    }
}
