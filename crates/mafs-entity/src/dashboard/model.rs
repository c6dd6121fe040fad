//! KPI aggregate value objects.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::ticket::TicketStatus;

/// Window and scope for dashboard queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardFilter {
    /// Tickets created at or after.
    pub from: Option<DateTime<Utc>>,
    /// Tickets created before.
    pub to: Option<DateTime<Utc>>,
    /// Plant code.
    pub plant: Option<String>,
}

/// Number of tickets in one status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    /// Status.
    pub status: TicketStatus,
    /// Ticket count.
    pub count: i64,
}

/// Headline KPIs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    /// Counts per status, statuses with no tickets omitted.
    pub status_counts: Vec<StatusCount>,
    /// All tickets in scope.
    pub total: i64,
    /// Tickets not in a terminal status.
    pub open: i64,
    /// Tickets past their due date and not done.
    pub overdue: i64,
    /// Mean hours from report to resolution.
    pub avg_resolution_hours: Option<f64>,
    /// Sum of reported downtime.
    pub total_downtime_hours: f64,
    /// Sum of reported cost avoidance.
    pub total_cost_avoidance: f64,
}

/// Tickets created and closed on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    /// Calendar day (UTC).
    pub date: NaiveDate,
    /// Tickets created that day.
    pub created: i64,
    /// Tickets closed that day.
    pub closed: i64,
}

/// A reporter and how many tickets they filed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReporterCount {
    /// User ID.
    pub user_id: i64,
    /// Display name.
    pub display_name: String,
    /// Ticket count.
    pub tickets: i64,
}
