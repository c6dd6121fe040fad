//! Ticket comment entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A free-text comment on a ticket.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TicketComment {
    /// Row ID.
    pub id: i64,
    /// Ticket ID.
    pub ticket_id: i64,
    /// Author.
    pub user_id: i64,
    /// Comment text.
    pub body: String,
    /// When the comment was posted.
    pub created_at: DateTime<Utc>,
}
