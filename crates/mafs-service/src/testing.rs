//! Shared fixtures for service tests.

use std::sync::Arc;

use mafs_auth::RequestContext;
use mafs_database::{MemoryStore, Stores};
use mafs_entity::user::{CreateUser, PermissionLevel, User};

pub(crate) fn stores() -> (Arc<MemoryStore>, Stores) {
    let memory = Arc::new(MemoryStore::with_reference_data());
    let stores = Stores::memory(Arc::clone(&memory));
    (memory, stores)
}

pub(crate) async fn user(
    stores: &Stores,
    username: &str,
    group: &str,
    level: PermissionLevel,
    line_id: Option<&str>,
) -> User {
    let created = stores
        .users
        .create(CreateUser {
            person_no: format!("P-{username}"),
            username: username.to_string(),
            display_name: username.to_uppercase(),
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

pub(crate) async fn ctx(stores: &Stores, user: &User) -> RequestContext {
    let permissions = stores.permissions.for_group(&user.group_code).await.unwrap();
    RequestContext::new(user.clone(), permissions)
}

/// An `open` ticket numbered after its id, created at `created_at`.
pub(crate) fn ticket_at(
    id: i64,
    created_by: i64,
    created_at: chrono::DateTime<chrono::Utc>,
) -> mafs_entity::ticket::Ticket {
    use mafs_entity::ticket::{Priority, Severity, Ticket, TicketStatus};

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
