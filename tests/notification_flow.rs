//! Scheduler and notification tasks wired together over the memory stores.

use std::sync::Arc;

use chrono::{Duration, Utc};

use mafs_core::config::NotificationsConfig;
use mafs_database::{MemoryStore, Stores};
use mafs_entity::schedule::{NotificationKind, ScheduleUpdate};
use mafs_entity::ticket::{Priority, Severity, Ticket, TicketStatus};
use mafs_entity::user::{CreateUser, PermissionLevel, User};
use mafs_messaging::{MessagePusher, RecordingPusher};
use mafs_service::notification::build_tasks;
use mafs_worker::{ArmState, NotificationScheduler, RunOutcome};

struct Harness {
    memory: Arc<MemoryStore>,
    stores: Stores,
    pusher: Arc<RecordingPusher>,
    scheduler: NotificationScheduler,
}

async fn harness(pusher: RecordingPusher) -> Harness {
    let memory = Arc::new(MemoryStore::with_reference_data());
    let stores = Stores::memory(Arc::clone(&memory));
    let pusher = Arc::new(pusher);
    let shared: Arc<dyn MessagePusher> = pusher.clone();
    let tasks = build_tasks(&stores, shared, &NotificationsConfig::default());
    let scheduler = NotificationScheduler::new(Arc::clone(&stores.schedules), tasks)
        .await
        .unwrap();
    Harness {
        memory,
        stores,
        pusher,
        scheduler,
    }
}

async fn user(stores: &Stores, name: &str, level: PermissionLevel, line_id: Option<&str>) -> User {
    let group = match level {
        PermissionLevel::Operator => "OPERATOR",
        PermissionLevel::Engineer => "ENGINEER",
        PermissionLevel::Manager => "MANAGER",
    };
    let created = stores
        .users
        .create(CreateUser {
            person_no: format!("P-{name}"),
            username: name.to_string(),
            display_name: name.to_uppercase(),
            email: None,
            department: None,
            group_code: group.to_string(),
            permission_level: level,
            password_hash: String::new(),
        })
        .await
        .unwrap();
    match line_id {
        Some(id) => stores.users.set_line_id(created.id, Some(id)).await.unwrap(),
        None => created,
    }
}

fn ticket(id: i64, created_by: i64, age: Duration) -> Ticket {
    let created_at = Utc::now() - age;
    Ticket {
        id,
        ticket_number: format!("AB-20260101-{id:04}"),
        title: format!("Finding {id}"),
        description: String::new(),
        pu_id: None,
        status: TicketStatus::Open,
        severity: Severity::High,
        priority: Priority::Normal,
        created_by,
        assigned_to: None,
        escalated_to: None,
        due_date: None,
        resolved_at: None,
        closed_at: None,
        created_at,
        updated_at: created_at,
        cost_avoidance: None,
        downtime_hours: None,
        failure_mode: None,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stale_ticket_reaches_engineers_with_line() {
    let h = harness(RecordingPusher::new()).await;
    let op = user(&h.stores, "op", PermissionLevel::Operator, Some("U-op")).await;
    user(&h.stores, "eng", PermissionLevel::Engineer, Some("U-eng")).await;
    user(&h.stores, "mgr", PermissionLevel::Manager, None).await;
    h.memory.put_ticket(ticket(1, op.id, Duration::hours(25))).await;
    h.memory.put_ticket(ticket(2, op.id, Duration::hours(1))).await;

    h.scheduler.start().await.unwrap();
    let outcome = h.scheduler.run_now(NotificationKind::OldOpenTickets).await.unwrap();

    let RunOutcome::Completed { summary } = outcome else {
        panic!("expected a completed run, got {outcome:?}");
    };
    assert_eq!(summary.candidates, 1);
    assert_eq!(summary.recipients, 2);
    assert_eq!(summary.sent, 1);
    assert_eq!(summary.skipped_no_line_id, 1);

    let sent = h.pusher.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "U-eng");
    assert!(sent[0].1.contains("AB-20260101-0001"));
    assert!(!sent[0].1.contains("AB-20260101-0002"));

    let row = h.stores.schedules.get("old_open_tickets").await.unwrap().unwrap();
    assert!(row.last_run.is_some());
    assert!(row.next_run.is_some_and(|next| next > Utc::now()));

    h.scheduler.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_due_reminder_goes_to_assignee_only() {
    let h = harness(RecordingPusher::new()).await;
    let op = user(&h.stores, "op", PermissionLevel::Operator, Some("U-op")).await;
    let eng = user(&h.stores, "eng", PermissionLevel::Engineer, Some("U-eng")).await;
    user(&h.stores, "eng2", PermissionLevel::Engineer, Some("U-eng2")).await;

    let mut due = ticket(1, op.id, Duration::hours(2));
    due.status = TicketStatus::InProgress;
    due.assigned_to = Some(eng.id);
    due.due_date = Some(Utc::now() + Duration::days(1));
    h.memory.put_ticket(due).await;

    let mut far = ticket(2, op.id, Duration::hours(2));
    far.status = TicketStatus::InProgress;
    far.assigned_to = Some(eng.id);
    far.due_date = Some(Utc::now() + Duration::days(30));
    h.memory.put_ticket(far).await;

    let outcome = h.scheduler.run_now(NotificationKind::DueDateReminder).await.unwrap();
    let RunOutcome::Completed { summary } = outcome else {
        panic!("expected a completed run, got {outcome:?}");
    };
    assert_eq!(summary.candidates, 1);
    assert_eq!(summary.sent, 1);

    let sent = h.pusher.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "U-eng");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_push_failures_are_counted_not_fatal() {
    let h = harness(RecordingPusher::failing_for(&["U-eng"])).await;
    let op = user(&h.stores, "op", PermissionLevel::Operator, None).await;
    user(&h.stores, "eng", PermissionLevel::Engineer, Some("U-eng")).await;
    user(&h.stores, "eng2", PermissionLevel::Engineer, Some("U-eng2")).await;
    h.memory.put_ticket(ticket(1, op.id, Duration::hours(48))).await;

    let outcome = h.scheduler.run_now(NotificationKind::OldOpenTickets).await.unwrap();
    let RunOutcome::Completed { summary } = outcome else {
        panic!("expected a completed run, got {outcome:?}");
    };
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.sent, 1);
    let sent = h.pusher.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "U-eng2");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_schedule_edit_rearms_job() {
    let h = harness(RecordingPusher::new()).await;
    h.scheduler.start().await.unwrap();

    let (row, state) = h
        .scheduler
        .update_schedule(
            NotificationKind::PendingTickets,
            ScheduleUpdate {
                schedule_cron: "15 16 * * *".into(),
                timezone: Some("UTC".into()),
                is_enabled: true,
            },
        )
        .await
        .unwrap();
    assert_eq!(row.schedule_cron, "15 16 * * *");
    let ArmState::Armed {
        next_run: Some(next_run),
        ..
    } = state
    else {
        panic!("expected armed with a next run, got {state:?}");
    };
    assert_eq!(next_run.format("%H:%M").to_string(), "16:15");

    let (row, state) = h
        .scheduler
        .update_schedule(
            NotificationKind::PendingTickets,
            ScheduleUpdate {
                schedule_cron: "15 16 * * *".into(),
                timezone: Some("UTC".into()),
                is_enabled: false,
            },
        )
        .await
        .unwrap();
    assert!(!row.is_enabled);
    assert!(row.next_run.is_none());
    assert!(matches!(state, ArmState::Disabled));

    let statuses = h.scheduler.statuses().await;
    let pending = statuses
        .iter()
        .find(|s| s.notification_type == NotificationKind::PendingTickets)
        .unwrap();
    assert!(!pending.state.is_armed());

    h.scheduler.shutdown().await;
}
