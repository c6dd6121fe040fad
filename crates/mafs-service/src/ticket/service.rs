//! Ticket reporting, listing, editing and comments.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use mafs_auth::{RequestContext, require_form, require_level};
use mafs_core::error::AppError;
use mafs_core::result::AppResult;
use mafs_core::types::{PageRequest, PageResponse};
use mafs_database::store::{HierarchyStore, TicketStore, UserStore};
use mafs_entity::permission::{FormAction, forms};
use mafs_entity::ticket::{
    NewTicket, Priority, Severity, Ticket, TicketAttachment, TicketComment, TicketFilter,
    TicketHistory, TicketPatch, TicketStatus,
};
use mafs_entity::user::PermissionLevel;

/// Longest accepted ticket title.
const MAX_TITLE_CHARS: usize = 200;

/// Data for reporting a new ticket.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    /// Short title.
    pub title: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Production unit by id.
    #[serde(default)]
    pub pu_id: Option<i64>,
    /// Production unit by composite code, used when `pu_id` is absent.
    #[serde(default)]
    pub pucode: Option<String>,
    /// Severity, defaults to medium.
    #[serde(default)]
    pub severity: Option<Severity>,
    /// Priority, defaults to normal.
    #[serde(default)]
    pub priority: Option<Priority>,
    /// Due date.
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// Editable ticket fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTicketRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub pu_id: Option<i64>,
    pub severity: Option<Severity>,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,
    pub cost_avoidance: Option<f64>,
    pub downtime_hours: Option<f64>,
    pub failure_mode: Option<String>,
}

/// Listing query as received from the caller.
#[derive(Debug, Clone, Default)]
pub struct TicketListQuery {
    /// Field filters.
    pub filter: TicketFilter,
    /// Restrict to tickets the caller reported or handles.
    pub mine: bool,
}

/// A ticket with everything shown on its detail page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketDetail {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub history: Vec<TicketHistory>,
    pub comments: Vec<TicketComment>,
    pub attachments: Vec<TicketAttachment>,
}

/// Ticket use cases other than status changes.
#[derive(Clone)]
pub struct TicketService {
    pub(crate) tickets: Arc<dyn TicketStore>,
    pub(crate) users: Arc<dyn UserStore>,
    hierarchy: Arc<dyn HierarchyStore>,
}

impl std::fmt::Debug for TicketService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketService").finish()
    }
}

impl TicketService {
    /// Creates a new ticket service.
    pub fn new(
        tickets: Arc<dyn TicketStore>,
        users: Arc<dyn UserStore>,
        hierarchy: Arc<dyn HierarchyStore>,
    ) -> Self {
        Self {
            tickets,
            users,
            hierarchy,
        }
    }

    /// Loads a ticket or fails with not found.
    pub async fn find(&self, id: i64) -> AppResult<Ticket> {
        self.tickets
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Ticket {id} not found")))
    }

    /// Reports a new ticket in status `open`.
    pub async fn create(&self, ctx: &RequestContext, req: CreateTicketRequest) -> AppResult<Ticket> {
        require_form(ctx, forms::TICKETS, FormAction::Create)?;

        let title = validate_title(&req.title)?;
        let pu_id = match (req.pu_id, req.pucode.as_deref().filter(|c| !c.is_empty())) {
            (Some(id), _) => Some(
                self.hierarchy
                    .find_unit(id)
                    .await?
                    .ok_or_else(|| AppError::validation(format!("Production unit {id} does not exist")))?
                    .id,
            ),
            (None, Some(code)) => Some(
                self.hierarchy
                    .find_unit_by_code(code)
                    .await?
                    .ok_or_else(|| {
                        AppError::validation(format!("Production unit '{code}' does not exist"))
                    })?
                    .id,
            ),
            (None, None) => None,
        };

        let ticket = self
            .tickets
            .create(NewTicket {
                title,
                description: req.description.trim().to_string(),
                pu_id,
                severity: req.severity.unwrap_or_default(),
                priority: req.priority.unwrap_or_default(),
                created_by: ctx.user_id(),
                due_date: req.due_date,
            })
            .await?;

        info!(
            ticket_id = ticket.id,
            ticket_number = %ticket.ticket_number,
            user_id = ctx.user_id(),
            "Ticket created"
        );
        Ok(ticket)
    }

    /// Lists tickets visible to the caller.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        query: TicketListQuery,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Ticket>> {
        require_form(ctx, forms::TICKETS, FormAction::View)?;

        let mut filter = query.filter;
        if query.mine {
            filter.involving = Some(ctx.user_id());
        }
        self.tickets.list(&filter, page).await
    }

    /// Gets a ticket with its history, comments and attachments.
    pub async fn detail(&self, ctx: &RequestContext, id: i64) -> AppResult<TicketDetail> {
        require_form(ctx, forms::TICKETS, FormAction::View)?;

        let ticket = self.find(id).await?;
        let history = self.tickets.history(id).await?;
        let comments = self.tickets.comments(id).await?;
        let attachments = self.tickets.attachments(id).await?;

        Ok(TicketDetail {
            ticket,
            history,
            comments,
            attachments,
        })
    }

    /// Edits ticket fields.
    ///
    /// The reporter may edit while the ticket is still `open`; otherwise the
    /// caller needs update rights on the tickets form and level 2.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: i64,
        req: UpdateTicketRequest,
    ) -> AppResult<Ticket> {
        let ticket = self.find(id).await?;

        let reporter_edit =
            ticket.created_by == ctx.user_id() && ticket.status == TicketStatus::Open;
        if !reporter_edit {
            require_form(ctx, forms::TICKETS, FormAction::Update)?;
            require_level(ctx, PermissionLevel::Engineer)?;
        }
        if ticket.status.is_terminal() {
            return Err(AppError::conflict(format!(
                "Ticket {} is {} and can no longer be edited",
                ticket.ticket_number, ticket.status
            ))
            .with_code("INVALID_STATUS"));
        }

        let title = req.title.as_deref().map(validate_title).transpose()?;
        if req.cost_avoidance.is_some_and(|v| v < 0.0) || req.downtime_hours.is_some_and(|v| v < 0.0)
        {
            return Err(AppError::validation("Cost and downtime figures cannot be negative"));
        }
        if let Some(pu_id) = req.pu_id {
            if self.hierarchy.find_unit(pu_id).await?.is_none() {
                return Err(AppError::validation(format!(
                    "Production unit {pu_id} does not exist"
                )));
            }
        }

        let patch = TicketPatch {
            title,
            description: req.description.map(|d| d.trim().to_string()),
            pu_id: req.pu_id,
            severity: req.severity,
            priority: req.priority,
            due_date: req.due_date,
            cost_avoidance: req.cost_avoidance,
            downtime_hours: req.downtime_hours,
            failure_mode: req.failure_mode,
            ..TicketPatch::default()
        };

        let updated = self.tickets.update(id, patch).await?;
        info!(ticket_id = id, user_id = ctx.user_id(), "Ticket updated");
        Ok(updated)
    }

    /// Posts a comment on a ticket.
    pub async fn add_comment(
        &self,
        ctx: &RequestContext,
        ticket_id: i64,
        body: &str,
    ) -> AppResult<TicketComment> {
        require_form(ctx, forms::TICKETS, FormAction::View)?;
        let body = body.trim();
        if body.is_empty() {
            return Err(AppError::validation("Comment cannot be empty"));
        }
        self.find(ticket_id).await?;
        self.tickets.add_comment(ticket_id, ctx.user_id(), body).await
    }

    /// Lists comments of a ticket.
    pub async fn comments(&self, ctx: &RequestContext, ticket_id: i64) -> AppResult<Vec<TicketComment>> {
        require_form(ctx, forms::TICKETS, FormAction::View)?;
        self.find(ticket_id).await?;
        self.tickets.comments(ticket_id).await
    }

    /// Lists the history of a ticket.
    pub async fn history(&self, ctx: &RequestContext, ticket_id: i64) -> AppResult<Vec<TicketHistory>> {
        require_form(ctx, forms::TICKETS, FormAction::View)?;
        self.find(ticket_id).await?;
        self.tickets.history(ticket_id).await
    }
}

fn validate_title(title: &str) -> AppResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::validation("Title is required"));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::validation(format!(
            "Title must be at most {MAX_TITLE_CHARS} characters"
        )));
    }
    Ok(title.to_string())
}

#[cfg(test)]
mod tests {
    use mafs_core::error::ErrorKind;

    use super::*;
    use crate::testing;

    fn service(stores: &mafs_database::Stores) -> TicketService {
        TicketService::new(
            Arc::clone(&stores.tickets),
            Arc::clone(&stores.users),
            Arc::clone(&stores.hierarchy),
        )
    }

    fn request(title: &str) -> CreateTicketRequest {
        CreateTicketRequest {
            title: title.into(),
            description: "Oil leak under the press".into(),
            pucode: Some("MT1-PRESS-L01-M01".into()),
            ..CreateTicketRequest::default()
        }
    }

    #[tokio::test]
    async fn test_create_resolves_pucode_and_numbers_ticket() {
        let (_, stores) = testing::stores();
        let op = testing::user(&stores, "op", "OPERATOR", PermissionLevel::Operator, None).await;
        let ctx = testing::ctx(&stores, &op).await;
        let svc = service(&stores);

        let ticket = svc.create(&ctx, request("  Oil leak  ")).await.unwrap();
        assert_eq!(ticket.title, "Oil leak");
        assert_eq!(ticket.status, TicketStatus::Open);
        assert!(ticket.pu_id.is_some());
        assert!(ticket.ticket_number.starts_with("AB-"));
        assert!(ticket.ticket_number.ends_with("-0001"));

        let detail = svc.detail(&ctx, ticket.id).await.unwrap();
        assert_eq!(detail.history.len(), 1);
        assert_eq!(detail.history[0].action, "create");
    }

    #[tokio::test]
    async fn test_unknown_pucode_is_validation_error() {
        let (_, stores) = testing::stores();
        let op = testing::user(&stores, "op", "OPERATOR", PermissionLevel::Operator, None).await;
        let mut req = request("Noise");
        req.pucode = Some("NOPE-X-Y-Z".into());
        let err = service(&stores)
            .create(&testing::ctx(&stores, &op).await, req)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_mine_restricts_listing() {
        let (_, stores) = testing::stores();
        let a = testing::user(&stores, "a", "OPERATOR", PermissionLevel::Operator, None).await;
        let b = testing::user(&stores, "b", "OPERATOR", PermissionLevel::Operator, None).await;
        let svc = service(&stores);
        let ctx_a = testing::ctx(&stores, &a).await;
        let ctx_b = testing::ctx(&stores, &b).await;
        svc.create(&ctx_a, request("From A")).await.unwrap();
        svc.create(&ctx_b, request("From B")).await.unwrap();

        let all = svc
            .list(&ctx_a, TicketListQuery::default(), &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(all.total, 2);

        let mine = svc
            .list(
                &ctx_a,
                TicketListQuery {
                    mine: true,
                    ..TicketListQuery::default()
                },
                &PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(mine.total, 1);
        assert_eq!(mine.items[0].title, "From A");
    }

    #[tokio::test]
    async fn test_operator_edits_only_own_open_ticket() {
        let (_, stores) = testing::stores();
        let a = testing::user(&stores, "a", "OPERATOR", PermissionLevel::Operator, None).await;
        let b = testing::user(&stores, "b", "OPERATOR", PermissionLevel::Operator, None).await;
        let svc = service(&stores);
        let ctx_a = testing::ctx(&stores, &a).await;
        let ticket = svc.create(&ctx_a, request("Mine")).await.unwrap();

        let edit = UpdateTicketRequest {
            title: Some("Mine, edited".into()),
            ..UpdateTicketRequest::default()
        };
        let updated = svc.update(&ctx_a, ticket.id, edit.clone()).await.unwrap();
        assert_eq!(updated.title, "Mine, edited");

        let err = svc
            .update(&testing::ctx(&stores, &b).await, ticket.id, edit)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
    }

    #[tokio::test]
    async fn test_empty_comment_rejected() {
        let (_, stores) = testing::stores();
        let a = testing::user(&stores, "a", "OPERATOR", PermissionLevel::Operator, None).await;
        let svc = service(&stores);
        let ctx = testing::ctx(&stores, &a).await;
        let ticket = svc.create(&ctx, request("Loose bolt")).await.unwrap();

        assert!(svc.add_comment(&ctx, ticket.id, "  ").await.is_err());
        svc.add_comment(&ctx, ticket.id, "Still loose").await.unwrap();
        assert_eq!(svc.comments(&ctx, ticket.id).await.unwrap().len(), 1);
    }
}
