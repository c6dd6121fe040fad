//! Ticket entity model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::{Priority, Severity, TicketStatus};

/// An abnormal finding reported against a production unit.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// Unique ticket identifier.
    pub id: i64,
    /// Human-facing number, `AB-YYYYMMDD-NNNN`.
    pub ticket_number: String,
    /// Short title.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Production unit the finding is on.
    pub pu_id: Option<i64>,
    /// Current workflow status.
    pub status: TicketStatus,
    /// Severity.
    pub severity: Severity,
    /// Priority.
    pub priority: Priority,
    /// Reporter.
    pub created_by: i64,
    /// Engineer working the ticket.
    pub assigned_to: Option<i64>,
    /// Manager the ticket was escalated to.
    pub escalated_to: Option<i64>,
    /// Due date.
    pub due_date: Option<DateTime<Utc>>,
    /// When the ticket entered `resolved`.
    pub resolved_at: Option<DateTime<Utc>>,
    /// When the ticket entered `closed`.
    pub closed_at: Option<DateTime<Utc>>,
    /// When the ticket was reported.
    pub created_at: DateTime<Utc>,
    /// When the ticket last changed.
    pub updated_at: DateTime<Utc>,
    /// Estimated cost avoided by the fix.
    pub cost_avoidance: Option<f64>,
    /// Production downtime caused, in hours.
    pub downtime_hours: Option<f64>,
    /// Failure mode classification.
    pub failure_mode: Option<String>,
}

impl Ticket {
    /// Whether the due date has passed and work is not finished.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.status.is_done() && self.due_date.is_some_and(|due| due < now)
    }

    /// Whether `user_id` is the assignee or the escalation target.
    pub fn is_handled_by(&self, user_id: i64) -> bool {
        self.assigned_to == Some(user_id) || self.escalated_to == Some(user_id)
    }
}

/// Data required to report a new ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTicket {
    /// Short title.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Production unit.
    pub pu_id: Option<i64>,
    /// Severity.
    pub severity: Severity,
    /// Priority.
    pub priority: Priority,
    /// Reporter.
    pub created_by: i64,
    /// Due date.
    pub due_date: Option<DateTime<Utc>>,
}

/// Field changes applied to a ticket. `None` fields are left unchanged.
///
/// Status changes always come with a history row, so `status` is only set
/// by the workflow service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketPatch {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New production unit.
    pub pu_id: Option<i64>,
    /// New severity.
    pub severity: Option<Severity>,
    /// New priority.
    pub priority: Option<Priority>,
    /// New due date.
    pub due_date: Option<DateTime<Utc>>,
    /// New status.
    pub status: Option<TicketStatus>,
    /// New assignee.
    pub assigned_to: Option<i64>,
    /// New escalation target. `Some(None)` clears it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalated_to: Option<Option<i64>>,
    /// Resolution timestamp.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Close timestamp.
    pub closed_at: Option<DateTime<Utc>>,
    /// Cost avoidance figure.
    pub cost_avoidance: Option<f64>,
    /// Downtime figure.
    pub downtime_hours: Option<f64>,
    /// Failure mode.
    pub failure_mode: Option<String>,
}

/// Filters for ticket listing. All set filters must match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketFilter {
    /// Exact status.
    pub status: Option<TicketStatus>,
    /// Assignee.
    pub assigned_to: Option<i64>,
    /// Reporter.
    pub created_by: Option<i64>,
    /// Production unit.
    pub pu_id: Option<i64>,
    /// Severity.
    pub severity: Option<Severity>,
    /// Priority.
    pub priority: Option<Priority>,
    /// Case-insensitive substring of title or ticket number.
    pub search: Option<String>,
    /// Created at or after.
    pub from: Option<DateTime<Utc>>,
    /// Created before.
    pub to: Option<DateTime<Utc>>,
    /// Tickets the user reported, is assigned or was escalated to.
    pub involving: Option<i64>,
}

impl TicketFilter {
    /// Check a ticket against the filter.
    pub fn matches(&self, ticket: &Ticket) -> bool {
        if self.status.is_some_and(|s| s != ticket.status) {
            return false;
        }
        if self.assigned_to.is_some() && self.assigned_to != ticket.assigned_to {
            return false;
        }
        if self.created_by.is_some_and(|id| id != ticket.created_by) {
            return false;
        }
        if self.pu_id.is_some() && self.pu_id != ticket.pu_id {
            return false;
        }
        if self.severity.is_some_and(|s| s != ticket.severity) {
            return false;
        }
        if self.priority.is_some_and(|p| p != ticket.priority) {
            return false;
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            if !ticket.title.to_lowercase().contains(&needle)
                && !ticket.ticket_number.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if self.from.is_some_and(|from| ticket.created_at < from) {
            return false;
        }
        if self.to.is_some_and(|to| ticket.created_at >= to) {
            return false;
        }
        if let Some(user_id) = self.involving {
            if ticket.created_by != user_id && !ticket.is_handled_by(user_id) {
                return false;
            }
        }
        true
    }
}

/// Format a ticket number from its creation date and per-day sequence.
pub fn format_ticket_number(date: NaiveDate, sequence: u32) -> String {
    format!("AB-{}-{:04}", date.format("%Y%m%d"), sequence)
}
