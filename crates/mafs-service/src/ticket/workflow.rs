//! Ticket status changes.
//!
//! Checks run in a fixed order: the ticket must exist (404), the caller
//! must be allowed to act (403), then the move must be legal from the
//! current status (409 `INVALID_STATUS`).

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use mafs_auth::{RequestContext, require_level};
use mafs_core::error::AppError;
use mafs_core::result::AppResult;
use mafs_entity::ticket::{NewHistory, Ticket, TicketAction, TicketPatch};
use mafs_entity::user::PermissionLevel;

use super::service::TicketService;

/// Parameters accompanying a workflow action.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRequest {
    /// Engineer to assign (`assign`, optionally `accept`).
    #[serde(default)]
    pub assignee_id: Option<i64>,
    /// Manager to escalate to (`escalate`).
    #[serde(default)]
    pub escalate_to: Option<i64>,
    /// Free-text note stored on the history row.
    #[serde(default)]
    pub note: Option<String>,
    /// Figures recorded on `complete`.
    #[serde(default)]
    pub cost_avoidance: Option<f64>,
    #[serde(default)]
    pub downtime_hours: Option<f64>,
    #[serde(default)]
    pub failure_mode: Option<String>,
}

impl TicketService {
    /// Applies a workflow action to a ticket and records it in the history.
    pub async fn perform(
        &self,
        ctx: &RequestContext,
        id: i64,
        action: TicketAction,
        req: WorkflowRequest,
    ) -> AppResult<Ticket> {
        let ticket = self.find(id).await?;
        authorize(ctx, &ticket, action)?;
        let target = action.transition(ticket.status)?;

        let now = Utc::now();
        let mut patch = TicketPatch {
            status: Some(target),
            ..TicketPatch::default()
        };

        match action {
            TicketAction::Accept => {
                let assignee = req.assignee_id.unwrap_or(ctx.user_id());
                if assignee != ctx.user_id() {
                    self.require_handler(assignee, PermissionLevel::Engineer).await?;
                }
                patch.assigned_to = Some(assignee);
                patch.escalated_to = Some(None);
            }
            TicketAction::Assign => {
                let assignee = req
                    .assignee_id
                    .ok_or_else(|| AppError::validation("assigneeId is required"))?;
                self.require_handler(assignee, PermissionLevel::Engineer).await?;
                patch.assigned_to = Some(assignee);
            }
            TicketAction::Escalate => {
                if let Some(manager) = req.escalate_to {
                    self.require_handler(manager, PermissionLevel::Manager).await?;
                }
                patch.escalated_to = Some(req.escalate_to);
            }
            TicketAction::Complete => {
                if req.cost_avoidance.is_some_and(|v| v < 0.0)
                    || req.downtime_hours.is_some_and(|v| v < 0.0)
                {
                    return Err(AppError::validation(
                        "Cost and downtime figures cannot be negative",
                    ));
                }
                patch.resolved_at = Some(now);
                patch.cost_avoidance = req.cost_avoidance;
                patch.downtime_hours = req.downtime_hours;
                patch.failure_mode = req.failure_mode.filter(|f| !f.trim().is_empty());
            }
            TicketAction::Close => patch.closed_at = Some(now),
            TicketAction::Reject | TicketAction::ReviewReopen => patch.escalated_to = Some(None),
            TicketAction::Start | TicketAction::ReviewReject | TicketAction::Reopen => {}
        }

        let history = NewHistory {
            ticket_id: id,
            from_status: Some(ticket.status),
            to_status: target,
            action: action.as_str().to_string(),
            actor_id: ctx.user_id(),
            note: req.note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        };

        let updated = self.tickets.transition(id, patch, history).await?;

        info!(
            ticket_id = id,
            action = action.as_str(),
            from = %ticket.status,
            to = %target,
            user_id = ctx.user_id(),
            "Ticket transitioned"
        );
        Ok(updated)
    }

    /// Checks that `user_id` is an active user at or above `min`.
    async fn require_handler(&self, user_id: i64, min: PermissionLevel) -> AppResult<()> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::validation(format!("User {user_id} is not an active user")))?;
        if user.level() < min {
            return Err(AppError::validation(format!(
                "{} does not have permission level {min}",
                user.display_name
            )));
        }
        Ok(())
    }
}

/// Personal roles (assignee, creator) unlock an action regardless of tier;
/// everyone else needs the action's required level.
fn authorize(ctx: &RequestContext, ticket: &Ticket, action: TicketAction) -> AppResult<()> {
    let personal = match action {
        TicketAction::Start | TicketAction::Complete => ticket.assigned_to == Some(ctx.user_id()),
        TicketAction::Close | TicketAction::Reopen => ticket.created_by == ctx.user_id(),
        _ => false,
    };
    if personal {
        return Ok(());
    }
    require_level(ctx, action.required_level())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mafs_core::error::ErrorKind;
    use mafs_entity::ticket::TicketStatus;
    use mafs_entity::user::User;

    use super::*;
    use crate::testing;
    use crate::ticket::CreateTicketRequest;

    struct Fixture {
        stores: mafs_database::Stores,
        svc: TicketService,
        operator: User,
        engineer: User,
        other_engineer: User,
        manager: User,
    }

    async fn fixture() -> Fixture {
        let (_, stores) = testing::stores();
        let svc = TicketService::new(
            Arc::clone(&stores.tickets),
            Arc::clone(&stores.users),
            Arc::clone(&stores.hierarchy),
        );
        let operator = testing::user(&stores, "op", "OPERATOR", PermissionLevel::Operator, None).await;
        let engineer = testing::user(&stores, "eng", "ENGINEER", PermissionLevel::Engineer, None).await;
        let other_engineer =
            testing::user(&stores, "eng2", "ENGINEER", PermissionLevel::Engineer, None).await;
        let manager = testing::user(&stores, "mgr", "MANAGER", PermissionLevel::Manager, None).await;
        Fixture {
            stores,
            svc,
            operator,
            engineer,
            other_engineer,
            manager,
        }
    }

    impl Fixture {
        async fn ctx(&self, user: &User) -> RequestContext {
            testing::ctx(&self.stores, user).await
        }

        async fn open_ticket(&self) -> Ticket {
            let ctx = self.ctx(&self.operator).await;
            self.svc
                .create(
                    &ctx,
                    CreateTicketRequest {
                        title: "Conveyor belt slipping".into(),
                        ..CreateTicketRequest::default()
                    },
                )
                .await
                .unwrap()
        }

        async fn act(&self, user: &User, id: i64, action: TicketAction) -> AppResult<Ticket> {
            let ctx = self.ctx(user).await;
            self.svc.perform(&ctx, id, action, WorkflowRequest::default()).await
        }
    }

    #[tokio::test]
    async fn test_full_happy_path() {
        let f = fixture().await;
        let ticket = f.open_ticket().await;

        let t = f.act(&f.engineer, ticket.id, TicketAction::Accept).await.unwrap();
        assert_eq!(t.status, TicketStatus::InProgress);
        assert_eq!(t.assigned_to, Some(f.engineer.id));

        let ctx = f.ctx(&f.engineer).await;
        let t = f
            .svc
            .perform(
                &ctx,
                ticket.id,
                TicketAction::Complete,
                WorkflowRequest {
                    downtime_hours: Some(1.5),
                    note: Some("Replaced belt".into()),
                    ..WorkflowRequest::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(t.status, TicketStatus::Resolved);
        assert!(t.resolved_at.is_some());
        assert_eq!(t.downtime_hours, Some(1.5));

        let t = f.act(&f.operator, ticket.id, TicketAction::Close).await.unwrap();
        assert_eq!(t.status, TicketStatus::Closed);
        assert!(t.closed_at.is_some());

        let history = f.stores.tickets.history(ticket.id).await.unwrap();
        let actions: Vec<&str> = history.iter().map(|h| h.action.as_str()).collect();
        assert_eq!(actions, ["create", "accept", "complete", "close"]);
        assert_eq!(history[2].note.as_deref(), Some("Replaced belt"));
    }

    #[tokio::test]
    async fn test_invalid_status_is_conflict() {
        let f = fixture().await;
        let ticket = f.open_ticket().await;

        let err = f.act(&f.manager, ticket.id, TicketAction::Close).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(err.code, Some("INVALID_STATUS"));
    }

    #[tokio::test]
    async fn test_operator_cannot_accept() {
        let f = fixture().await;
        let ticket = f.open_ticket().await;

        let err = f.act(&f.operator, ticket.id, TicketAction::Accept).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
    }

    #[tokio::test]
    async fn test_missing_ticket_is_not_found() {
        let f = fixture().await;
        let err = f.act(&f.manager, 9999, TicketAction::Accept).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_assign_then_only_assignee_starts() {
        let f = fixture().await;
        let ticket = f.open_ticket().await;

        let ctx = f.ctx(&f.manager).await;
        let err = f
            .svc
            .perform(&ctx, ticket.id, TicketAction::Assign, WorkflowRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let t = f
            .svc
            .perform(
                &ctx,
                ticket.id,
                TicketAction::Assign,
                WorkflowRequest {
                    assignee_id: Some(f.engineer.id),
                    ..WorkflowRequest::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(t.status, TicketStatus::Assigned);

        let err = f
            .act(&f.other_engineer, ticket.id, TicketAction::Start)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);

        let t = f.act(&f.engineer, ticket.id, TicketAction::Start).await.unwrap();
        assert_eq!(t.status, TicketStatus::InProgress);
    }

    #[tokio::test]
    async fn test_reject_review_reopen() {
        let f = fixture().await;
        let ticket = f.open_ticket().await;

        let t = f.act(&f.engineer, ticket.id, TicketAction::Reject).await.unwrap();
        assert_eq!(t.status, TicketStatus::RejectedPendingL3Review);

        let err = f
            .act(&f.engineer, ticket.id, TicketAction::ReviewReopen)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);

        let t = f.act(&f.manager, ticket.id, TicketAction::ReviewReopen).await.unwrap();
        assert_eq!(t.status, TicketStatus::Open);
    }

    #[tokio::test]
    async fn test_escalate_target_must_be_manager() {
        let f = fixture().await;
        let ticket = f.open_ticket().await;
        let ctx = f.ctx(&f.engineer).await;

        let err = f
            .svc
            .perform(
                &ctx,
                ticket.id,
                TicketAction::Escalate,
                WorkflowRequest {
                    escalate_to: Some(f.other_engineer.id),
                    ..WorkflowRequest::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let t = f
            .svc
            .perform(
                &ctx,
                ticket.id,
                TicketAction::Escalate,
                WorkflowRequest {
                    escalate_to: Some(f.manager.id),
                    ..WorkflowRequest::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(t.status, TicketStatus::Escalated);
        assert_eq!(t.escalated_to, Some(f.manager.id));
    }

    #[tokio::test]
    async fn test_untargeted_escalation_clears_previous_target() {
        let f = fixture().await;
        let ticket = f.open_ticket().await;
        let ctx = f.ctx(&f.engineer).await;
        let escalate = |to: Option<i64>| WorkflowRequest {
            escalate_to: to,
            ..WorkflowRequest::default()
        };

        let t = f
            .svc
            .perform(&ctx, ticket.id, TicketAction::Escalate, escalate(Some(f.manager.id)))
            .await
            .unwrap();
        assert_eq!(t.escalated_to, Some(f.manager.id));

        let t = f.act(&f.engineer, ticket.id, TicketAction::Accept).await.unwrap();
        assert_eq!(t.status, TicketStatus::InProgress);
        assert_eq!(t.escalated_to, None);

        let t = f
            .svc
            .perform(&ctx, ticket.id, TicketAction::Escalate, escalate(None))
            .await
            .unwrap();
        assert_eq!(t.status, TicketStatus::Escalated);
        assert_eq!(t.escalated_to, None);
    }
}
