//! Ticket workflow actions and their accepted prior statuses.
//!
//! Every route that moves a ticket reads its transition from this table, so
//! the set of legal moves is visible in one place.

use serde::{Deserialize, Serialize};
use std::fmt;

use mafs_core::AppError;

use super::status::TicketStatus;
use crate::user::PermissionLevel;

/// An action that moves a ticket from one status to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketAction {
    /// An engineer takes the ticket and starts work.
    Accept,
    /// A manager assigns the ticket to an engineer.
    Assign,
    /// The assignee starts work on an assigned ticket.
    Start,
    /// An engineer rejects the finding; a manager must review.
    Reject,
    /// Hand the ticket to a manager.
    Escalate,
    /// Work finished.
    Complete,
    /// A manager confirms the rejection.
    ReviewReject,
    /// A manager overturns the rejection and reopens the ticket.
    ReviewReopen,
    /// The reporter (or a manager) accepts the resolution.
    Close,
    /// The reporter (or a manager) sends the ticket back for more work.
    Reopen,
}

impl TicketAction {
    /// Return the action as it is recorded in the history table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Assign => "assign",
            Self::Start => "start",
            Self::Reject => "reject",
            Self::Escalate => "escalate",
            Self::Complete => "complete",
            Self::ReviewReject => "review_reject",
            Self::ReviewReopen => "review_reopen",
            Self::Close => "close",
            Self::Reopen => "reopen",
        }
    }

    /// Statuses from which this action may be taken.
    pub fn allowed_from(&self) -> &'static [TicketStatus] {
        use TicketStatus::*;
        match self {
            Self::Accept => &[Open, Escalated],
            Self::Assign => &[Open],
            Self::Start => &[Assigned],
            Self::Reject => &[Open, Assigned],
            Self::Escalate => &[Open, Assigned, InProgress, ReopenedInProgress],
            Self::Complete => &[InProgress, ReopenedInProgress],
            Self::ReviewReject | Self::ReviewReopen => &[RejectedPendingL3Review],
            Self::Close | Self::Reopen => &[Resolved],
        }
    }

    /// Status after the action.
    pub fn target(&self) -> TicketStatus {
        match self {
            Self::Accept | Self::Start => TicketStatus::InProgress,
            Self::Assign => TicketStatus::Assigned,
            Self::Reject => TicketStatus::RejectedPendingL3Review,
            Self::Escalate => TicketStatus::Escalated,
            Self::Complete => TicketStatus::Resolved,
            Self::ReviewReject => TicketStatus::RejectedFinal,
            Self::ReviewReopen => TicketStatus::Open,
            Self::Close => TicketStatus::Closed,
            Self::Reopen => TicketStatus::ReopenedInProgress,
        }
    }

    /// Minimum tier for the action when the actor has no personal role on
    /// the ticket (not its assignee or creator).
    pub fn required_level(&self) -> PermissionLevel {
        match self {
            Self::Accept | Self::Reject | Self::Escalate => PermissionLevel::Engineer,
            Self::Assign | Self::ReviewReject | Self::ReviewReopen => PermissionLevel::Manager,
            Self::Start | Self::Complete => PermissionLevel::Manager,
            Self::Close | Self::Reopen => PermissionLevel::Manager,
        }
    }

    /// Validate a transition from `current`, returning the new status.
    ///
    /// Fails with a conflict carrying the `INVALID_STATUS` code.
    pub fn transition(&self, current: TicketStatus) -> Result<TicketStatus, AppError> {
        if self.allowed_from().contains(&current) {
            Ok(self.target())
        } else {
            Err(AppError::conflict(format!(
                "Cannot {} a ticket in status '{}'",
                self.as_str().replace('_', " "),
                current
            ))
            .with_code("INVALID_STATUS"))
        }
    }
}

impl fmt::Display for TicketAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mafs_core::error::ErrorKind;

    #[test]
    fn test_accept_from_open_goes_in_progress() {
        assert_eq!(
            TicketAction::Accept.transition(TicketStatus::Open).unwrap(),
            TicketStatus::InProgress
        );
    }

    #[test]
    fn test_close_requires_resolved() {
        let err = TicketAction::Close
            .transition(TicketStatus::InProgress)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(err.code, Some("INVALID_STATUS"));
    }

    #[test]
    fn test_terminal_statuses_accept_nothing() {
        let actions = [
            TicketAction::Accept,
            TicketAction::Assign,
            TicketAction::Start,
            TicketAction::Reject,
            TicketAction::Escalate,
            TicketAction::Complete,
            TicketAction::ReviewReject,
            TicketAction::ReviewReopen,
            TicketAction::Close,
            TicketAction::Reopen,
        ];
        for action in actions {
            assert!(action.transition(TicketStatus::Closed).is_err());
            assert!(action.transition(TicketStatus::RejectedFinal).is_err());
        }
    }

    #[test]
    fn test_review_reopen_returns_to_open() {
        assert_eq!(
            TicketAction::ReviewReopen
                .transition(TicketStatus::RejectedPendingL3Review)
                .unwrap(),
            TicketStatus::Open
        );
    }
}
