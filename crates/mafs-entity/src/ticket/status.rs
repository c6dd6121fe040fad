//! Ticket status, severity and priority enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use mafs_core::AppError;

/// Lifecycle state of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ticket_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Reported, waiting for an engineer.
    Open,
    /// Assigned by a manager, not yet started.
    Assigned,
    /// Being worked on.
    InProgress,
    /// Work finished, waiting for the reporter to close.
    Resolved,
    /// Done.
    Closed,
    /// Rejected by an engineer, waiting for manager review.
    RejectedPendingL3Review,
    /// Rejection confirmed by a manager.
    RejectedFinal,
    /// Escalated to a manager.
    Escalated,
    /// Reopened after resolution and being worked on again.
    ReopenedInProgress,
}

impl TicketStatus {
    /// All statuses in display order.
    pub const ALL: [TicketStatus; 9] = [
        Self::Open,
        Self::Assigned,
        Self::InProgress,
        Self::Resolved,
        Self::Closed,
        Self::RejectedPendingL3Review,
        Self::RejectedFinal,
        Self::Escalated,
        Self::ReopenedInProgress,
    ];

    /// Return the status as its stored string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
            Self::RejectedPendingL3Review => "rejected_pending_l3_review",
            Self::RejectedFinal => "rejected_final",
            Self::Escalated => "escalated",
            Self::ReopenedInProgress => "reopened_in_progress",
        }
    }

    /// No further workflow actions apply.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::RejectedFinal)
    }

    /// Work on the ticket is finished (due dates no longer matter).
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Resolved | Self::Closed | Self::RejectedFinal)
    }

    /// Waiting on the assignee.
    pub fn awaits_assignee(&self) -> bool {
        matches!(
            self,
            Self::Assigned | Self::InProgress | Self::ReopenedInProgress
        )
    }

    /// Waiting on a manager decision.
    pub fn awaits_manager(&self) -> bool {
        matches!(self, Self::Escalated | Self::RejectedPendingL3Review)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AppError::validation(format!("Invalid ticket status: '{s}'")))
    }
}

/// How serious the finding is.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "ticket_severity", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Cosmetic.
    Low,
    /// Degraded operation.
    #[default]
    Medium,
    /// Production impact.
    High,
    /// Safety or line-down.
    Critical,
}

impl Severity {
    /// Return the severity as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl FromStr for Severity {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(AppError::validation(format!(
                "Invalid severity: '{s}'. Expected one of: low, medium, high, critical"
            ))),
        }
    }
}

/// How soon the ticket should be handled.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "ticket_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Whenever convenient.
    Low,
    /// Within the normal queue.
    #[default]
    Normal,
    /// Ahead of the queue.
    High,
    /// Immediately.
    Urgent,
}

impl Priority {
    /// Return the priority as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl FromStr for Priority {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            _ => Err(AppError::validation(format!(
                "Invalid priority: '{s}'. Expected one of: low, normal, high, urgent"
            ))),
        }
    }
}
