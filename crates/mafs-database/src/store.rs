//! Store traits.
//!
//! Each trait covers one aggregate. Implementations must be cheap to share
//! behind an `Arc` and safe to call concurrently.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use mafs_core::result::AppResult;
use mafs_core::types::{PageRequest, PageResponse};
use mafs_entity::dashboard::{DashboardFilter, DashboardSummary, ReporterCount, TrendPoint};
use mafs_entity::hierarchy::{Area, Line, Machine, NewProductionUnit, Plant, ProductionUnit};
use mafs_entity::permission::FormPermission;
use mafs_entity::schedule::{NotificationSchedule, ScheduleUpdate};
use mafs_entity::ticket::{
    NewAttachment, NewHistory, NewTicket, Ticket, TicketAttachment, TicketComment, TicketFilter,
    TicketHistory, TicketPatch,
};
use mafs_entity::user::{CreateUser, UpdateProfile, UpdateUser, User};

/// User accounts.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// Find a user by primary key.
    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>>;

    /// Find a user whose username (case-insensitive) or person number
    /// equals `login`.
    async fn find_by_login(&self, login: &str) -> AppResult<Option<User>>;

    /// Find the user linked to a LINE id.
    async fn find_by_line_id(&self, line_id: &str) -> AppResult<Option<User>>;

    /// Fetch several users at once. Unknown ids are skipped.
    async fn find_many(&self, ids: &[i64]) -> AppResult<Vec<User>>;

    /// List users, optionally filtered by a name/username/person-no search.
    async fn list(&self, search: Option<&str>, page: &PageRequest)
    -> AppResult<PageResponse<User>>;

    /// Active users at or above a permission level, ordered by display name.
    async fn list_active_at_level(&self, min_level: i16) -> AppResult<Vec<User>>;

    /// Total number of users.
    async fn count(&self) -> AppResult<i64>;

    /// Create a user. Duplicate username or person number is a conflict.
    async fn create(&self, data: CreateUser) -> AppResult<User>;

    /// Apply administrative changes.
    async fn update(&self, id: i64, data: UpdateUser) -> AppResult<User>;

    /// Apply self-service profile changes.
    async fn update_profile(&self, id: i64, data: UpdateProfile) -> AppResult<User>;

    /// Replace the password hash.
    async fn update_password(&self, id: i64, password_hash: &str) -> AppResult<()>;

    /// Link or unlink a LINE id. A LINE id linked to another user is a
    /// conflict.
    async fn set_line_id(&self, id: i64, line_id: Option<&str>) -> AppResult<User>;

    /// Record the stored avatar path.
    async fn set_avatar(&self, id: i64, avatar_path: &str) -> AppResult<User>;

    /// Stamp a successful login.
    async fn touch_login(&self, id: i64) -> AppResult<()>;
}

/// Per-group form permission flags.
#[async_trait]
pub trait PermissionStore: Send + Sync + 'static {
    /// Rows for one group.
    async fn for_group(&self, group_code: &str) -> AppResult<Vec<FormPermission>>;

    /// All rows, ordered by group then form.
    async fn list(&self) -> AppResult<Vec<FormPermission>>;

    /// Insert or replace one row.
    async fn upsert(&self, permission: &FormPermission) -> AppResult<()>;
}

/// Tickets with their history, comments and attachments.
#[async_trait]
pub trait TicketStore: Send + Sync + 'static {
    /// Create a ticket with the next number for its day and its `create`
    /// history row, atomically.
    async fn create(&self, data: NewTicket) -> AppResult<Ticket>;

    /// Find a ticket by primary key.
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Ticket>>;

    /// Filtered listing, newest first.
    async fn list(&self, filter: &TicketFilter, page: &PageRequest)
    -> AppResult<PageResponse<Ticket>>;

    /// Apply field changes. Unknown id is not found.
    async fn update(&self, id: i64, patch: TicketPatch) -> AppResult<Ticket>;

    /// Apply a status change and append its history row.
    async fn transition(&self, id: i64, patch: TicketPatch, history: NewHistory)
    -> AppResult<Ticket>;

    /// History rows, oldest first.
    async fn history(&self, ticket_id: i64) -> AppResult<Vec<TicketHistory>>;

    /// Post a comment.
    async fn add_comment(&self, ticket_id: i64, user_id: i64, body: &str)
    -> AppResult<TicketComment>;

    /// Comments, oldest first.
    async fn comments(&self, ticket_id: i64) -> AppResult<Vec<TicketComment>>;

    /// Record a stored attachment.
    async fn add_attachment(&self, data: NewAttachment) -> AppResult<TicketAttachment>;

    /// Attachments of a ticket, oldest first.
    async fn attachments(&self, ticket_id: i64) -> AppResult<Vec<TicketAttachment>>;

    /// Find one attachment.
    async fn find_attachment(&self, id: i64) -> AppResult<Option<TicketAttachment>>;

    /// Remove an attachment row.
    async fn delete_attachment(&self, id: i64) -> AppResult<()>;

    /// Tickets still `open` that were created at or before `created_before`,
    /// oldest first.
    async fn stale_open(&self, created_before: DateTime<Utc>) -> AppResult<Vec<Ticket>>;

    /// Tickets with an assignee, due at or before `due_before`, whose work is
    /// not done; earliest due date first.
    async fn due_before(&self, due_before: DateTime<Utc>) -> AppResult<Vec<Ticket>>;

    /// Tickets waiting on their assignee or on a manager, oldest first.
    async fn pending(&self) -> AppResult<Vec<Ticket>>;

    /// Headline KPIs.
    async fn summary(&self, filter: &DashboardFilter, now: DateTime<Utc>)
    -> AppResult<DashboardSummary>;

    /// Per-day created and closed counts, ascending by day.
    async fn trend(&self, filter: &DashboardFilter) -> AppResult<Vec<TrendPoint>>;

    /// Reporters ordered by ticket count, descending.
    async fn top_reporters(&self, filter: &DashboardFilter, limit: i64)
    -> AppResult<Vec<ReporterCount>>;
}

/// Plant hierarchy lookups.
#[async_trait]
pub trait HierarchyStore: Send + Sync + 'static {
    /// All plants by code.
    async fn plants(&self) -> AppResult<Vec<Plant>>;

    /// Areas in a plant.
    async fn areas(&self, plant_id: i64) -> AppResult<Vec<Area>>;

    /// Lines in an area.
    async fn lines(&self, area_id: i64) -> AppResult<Vec<Line>>;

    /// Machines on a line.
    async fn machines(&self, line_id: i64) -> AppResult<Vec<Machine>>;

    /// Active production units whose code or name contains `search`.
    async fn search_units(&self, search: Option<&str>, limit: i64)
    -> AppResult<Vec<ProductionUnit>>;

    /// Find a production unit by composite code.
    async fn find_unit_by_code(&self, pucode: &str) -> AppResult<Option<ProductionUnit>>;

    /// Find a production unit by id.
    async fn find_unit(&self, id: i64) -> AppResult<Option<ProductionUnit>>;

    /// Register a production unit. Duplicate code is a conflict.
    async fn create_unit(&self, data: NewProductionUnit) -> AppResult<ProductionUnit>;
}

/// Notification schedule rows.
#[async_trait]
pub trait ScheduleStore: Send + Sync + 'static {
    /// Read the row for a type key.
    async fn get(&self, notification_type: &str) -> AppResult<Option<NotificationSchedule>>;

    /// All rows, ordered by type key.
    async fn list(&self) -> AppResult<Vec<NotificationSchedule>>;

    /// Replace cron, timezone and enabled flag. Unknown type is not found.
    async fn update(&self, notification_type: &str, data: ScheduleUpdate)
    -> AppResult<NotificationSchedule>;

    /// Stamp `last_run`.
    async fn mark_started(&self, notification_type: &str, at: DateTime<Utc>) -> AppResult<()>;

    /// Persist the computed `next_run`.
    async fn set_next_run(&self, notification_type: &str, next_run: Option<DateTime<Utc>>)
    -> AppResult<()>;
}
