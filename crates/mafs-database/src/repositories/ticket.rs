//! Ticket repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use mafs_core::error::{AppError, ErrorKind};
use mafs_core::result::AppResult;
use mafs_core::types::{PageRequest, PageResponse};
use mafs_entity::dashboard::{DashboardFilter, DashboardSummary, ReporterCount, TrendPoint};
use mafs_entity::ticket::{
    NewAttachment, NewHistory, NewTicket, Ticket, TicketAttachment, TicketComment, TicketFilter,
    TicketHistory, TicketPatch, TicketStatus, format_ticket_number,
};

use super::like_pattern;
use crate::store::TicketStore;

/// Shared WHERE clause for filtered listings. Every parameter is always
/// bound; `NULL` disables its condition.
const FILTER_WHERE: &str = "WHERE ($1::ticket_status IS NULL OR status = $1) \
     AND ($2::bigint IS NULL OR assigned_to = $2) \
     AND ($3::bigint IS NULL OR created_by = $3) \
     AND ($4::bigint IS NULL OR pu_id = $4) \
     AND ($5::ticket_severity IS NULL OR severity = $5) \
     AND ($6::ticket_priority IS NULL OR priority = $6) \
     AND ($7::text IS NULL OR title ILIKE $7 OR ticket_number ILIKE $7) \
     AND ($8::timestamptz IS NULL OR created_at >= $8) \
     AND ($9::timestamptz IS NULL OR created_at < $9) \
     AND ($10::bigint IS NULL OR created_by = $10 OR assigned_to = $10 OR escalated_to = $10)";

macro_rules! bind_filter {
    ($query:expr, $filter:expr, $pattern:expr) => {
        $query
            .bind($filter.status)
            .bind($filter.assigned_to)
            .bind($filter.created_by)
            .bind($filter.pu_id)
            .bind($filter.severity)
            .bind($filter.priority)
            .bind($pattern)
            .bind($filter.from)
            .bind($filter.to)
            .bind($filter.involving)
    };
}

/// Repository for tickets and their child rows.
#[derive(Debug, Clone)]
pub struct TicketRepository {
    pool: PgPool,
}

impl TicketRepository {
    /// Create a new ticket repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TicketStore for TicketRepository {
    async fn create(&self, data: NewTicket) -> AppResult<Ticket> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let today = Utc::now().date_naive();
        let prefix = format!("AB-{}-", today.format("%Y%m%d"));

        // Serializes number allocation for the day across connections.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(&prefix)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to lock ticket sequence", e)
            })?;

        let last: Option<i32> = sqlx::query_scalar(
            "SELECT MAX(CAST(SUBSTRING(ticket_number FROM 13) AS INTEGER)) \
             FROM tickets WHERE ticket_number LIKE $1",
        )
        .bind(format!("{prefix}%"))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to read ticket sequence", e)
        })?;

        let sequence = u32::try_from(last.unwrap_or(0)).unwrap_or(0) + 1;
        let number = format_ticket_number(today, sequence);

        let ticket = sqlx::query_as::<_, Ticket>(
            "INSERT INTO tickets (ticket_number, title, description, pu_id, severity, priority, \
             created_by, due_date) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(&number)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.pu_id)
        .bind(data.severity)
        .bind(data.priority)
        .bind(data.created_by)
        .bind(data.due_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create ticket", e))?;

        sqlx::query(
            "INSERT INTO ticket_history (ticket_id, from_status, to_status, action, actor_id) \
             VALUES ($1, NULL, $2, 'create', $3)",
        )
        .bind(ticket.id)
        .bind(TicketStatus::Open)
        .bind(data.created_by)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to record ticket history", e)
        })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit ticket", e)
        })?;

        Ok(ticket)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Ticket>> {
        sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find ticket", e))
    }

    async fn list(
        &self,
        filter: &TicketFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Ticket>> {
        let pattern = filter
            .search
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(like_pattern);

        let count_sql = format!("SELECT COUNT(*) FROM tickets {FILTER_WHERE}");
        let total: i64 = bind_filter!(sqlx::query_scalar::<_, i64>(&count_sql), filter, &pattern)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count tickets", e))?;

        let select_sql = format!(
            "SELECT * FROM tickets {FILTER_WHERE} ORDER BY created_at DESC, id DESC \
             LIMIT $11 OFFSET $12"
        );
        let tickets = bind_filter!(sqlx::query_as::<_, Ticket>(&select_sql), filter, &pattern)
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list tickets", e))?;

        Ok(PageResponse::new(tickets, page, total as u64))
    }

    async fn update(&self, id: i64, patch: TicketPatch) -> AppResult<Ticket> {
        sqlx::query_as::<_, Ticket>(
            "UPDATE tickets SET \
             title = COALESCE($2, title), \
             description = COALESCE($3, description), \
             pu_id = COALESCE($4, pu_id), \
             severity = COALESCE($5, severity), \
             priority = COALESCE($6, priority), \
             due_date = COALESCE($7, due_date), \
             status = COALESCE($8, status), \
             assigned_to = COALESCE($9, assigned_to), \
             escalated_to = CASE WHEN $16 THEN $10 ELSE escalated_to END, \
             resolved_at = COALESCE($11, resolved_at), \
             closed_at = COALESCE($12, closed_at), \
             cost_avoidance = COALESCE($13, cost_avoidance), \
             downtime_hours = COALESCE($14, downtime_hours), \
             failure_mode = COALESCE($15, failure_mode), \
             updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(patch.pu_id)
        .bind(patch.severity)
        .bind(patch.priority)
        .bind(patch.due_date)
        .bind(patch.status)
        .bind(patch.assigned_to)
        .bind(patch.escalated_to.flatten())
        .bind(patch.resolved_at)
        .bind(patch.closed_at)
        .bind(patch.cost_avoidance)
        .bind(patch.downtime_hours)
        .bind(&patch.failure_mode)
        .bind(patch.escalated_to.is_some())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update ticket", e))?
        .ok_or_else(|| AppError::not_found(format!("Ticket {id} not found")))
    }

    async fn transition(
        &self,
        id: i64,
        patch: TicketPatch,
        history: NewHistory,
    ) -> AppResult<Ticket> {
        let ticket = self.update(id, patch).await?;

        sqlx::query(
            "INSERT INTO ticket_history (ticket_id, from_status, to_status, action, actor_id, note) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(history.ticket_id)
        .bind(history.from_status)
        .bind(history.to_status)
        .bind(&history.action)
        .bind(history.actor_id)
        .bind(&history.note)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to record ticket history", e)
        })?;

        Ok(ticket)
    }

    async fn history(&self, ticket_id: i64) -> AppResult<Vec<TicketHistory>> {
        sqlx::query_as::<_, TicketHistory>(
            "SELECT * FROM ticket_history WHERE ticket_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load history", e))
    }

    async fn add_comment(
        &self,
        ticket_id: i64,
        user_id: i64,
        body: &str,
    ) -> AppResult<TicketComment> {
        sqlx::query_as::<_, TicketComment>(
            "INSERT INTO ticket_comments (ticket_id, user_id, body) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(ticket_id)
        .bind(user_id)
        .bind(body)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to add comment", e))
    }

    async fn comments(&self, ticket_id: i64) -> AppResult<Vec<TicketComment>> {
        sqlx::query_as::<_, TicketComment>(
            "SELECT * FROM ticket_comments WHERE ticket_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load comments", e))
    }

    async fn add_attachment(&self, data: NewAttachment) -> AppResult<TicketAttachment> {
        sqlx::query_as::<_, TicketAttachment>(
            "INSERT INTO ticket_attachments \
             (ticket_id, uploaded_by, kind, file_name, stored_path, mime_type, size_bytes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(data.ticket_id)
        .bind(data.uploaded_by)
        .bind(data.kind)
        .bind(&data.file_name)
        .bind(&data.stored_path)
        .bind(&data.mime_type)
        .bind(data.size_bytes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record attachment", e))
    }

    async fn attachments(&self, ticket_id: i64) -> AppResult<Vec<TicketAttachment>> {
        sqlx::query_as::<_, TicketAttachment>(
            "SELECT * FROM ticket_attachments WHERE ticket_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load attachments", e))
    }

    async fn find_attachment(&self, id: i64) -> AppResult<Option<TicketAttachment>> {
        sqlx::query_as::<_, TicketAttachment>("SELECT * FROM ticket_attachments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find attachment", e)
            })
    }

    async fn delete_attachment(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM ticket_attachments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete attachment", e)
            })?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Attachment {id} not found")));
        }
        Ok(())
    }

    async fn stale_open(&self, created_before: DateTime<Utc>) -> AppResult<Vec<Ticket>> {
        sqlx::query_as::<_, Ticket>(
            "SELECT * FROM tickets WHERE status = 'open' AND created_at <= $1 \
             ORDER BY created_at ASC, id ASC",
        )
        .bind(created_before)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to query stale open tickets", e)
        })
    }

    async fn due_before(&self, due_before: DateTime<Utc>) -> AppResult<Vec<Ticket>> {
        sqlx::query_as::<_, Ticket>(
            "SELECT * FROM tickets WHERE assigned_to IS NOT NULL \
             AND due_date IS NOT NULL AND due_date <= $1 \
             AND status NOT IN ('resolved', 'closed', 'rejected_final') \
             ORDER BY due_date ASC, id ASC",
        )
        .bind(due_before)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to query due tickets", e)
        })
    }

    async fn pending(&self) -> AppResult<Vec<Ticket>> {
        sqlx::query_as::<_, Ticket>(
            "SELECT * FROM tickets WHERE \
             (status IN ('assigned', 'in_progress', 'reopened_in_progress') AND assigned_to IS NOT NULL) \
             OR status IN ('escalated', 'rejected_pending_l3_review') \
             ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to query pending tickets", e)
        })
    }

    async fn summary(
        &self,
        filter: &DashboardFilter,
        now: DateTime<Utc>,
    ) -> AppResult<DashboardSummary> {
        super::dashboard::summary(self.pool(), filter, now).await
    }

    async fn trend(&self, filter: &DashboardFilter) -> AppResult<Vec<TrendPoint>> {
        super::dashboard::trend(self.pool(), filter).await
    }

    async fn top_reporters(
        &self,
        filter: &DashboardFilter,
        limit: i64,
    ) -> AppResult<Vec<ReporterCount>> {
        super::dashboard::top_reporters(self.pool(), filter, limit).await
    }
}
