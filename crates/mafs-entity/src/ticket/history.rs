//! Ticket history entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::TicketStatus;

/// One workflow action recorded against a ticket.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TicketHistory {
    /// Row ID.
    pub id: i64,
    /// Ticket the action applied to.
    pub ticket_id: i64,
    /// Status before the action (`None` on creation).
    pub from_status: Option<TicketStatus>,
    /// Status after the action.
    pub to_status: TicketStatus,
    /// Action name (`create`, `accept`, ...).
    pub action: String,
    /// User who took the action.
    pub actor_id: i64,
    /// Optional note from the actor.
    pub note: Option<String>,
    /// When the action was taken.
    pub created_at: DateTime<Utc>,
}

/// Data for appending a history row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHistory {
    /// Ticket ID.
    pub ticket_id: i64,
    /// Prior status.
    pub from_status: Option<TicketStatus>,
    /// New status.
    pub to_status: TicketStatus,
    /// Action name.
    pub action: String,
    /// Acting user.
    pub actor_id: i64,
    /// Optional note.
    pub note: Option<String>,
}
