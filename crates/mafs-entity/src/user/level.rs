//! Workflow permission tiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The L1/L2/L3 tiers gating ticket workflow actions.
///
/// Stored on the user row as a small integer (1, 2 or 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PermissionLevel {
    /// L1: reports abnormal findings.
    Operator = 1,
    /// L2: accepts, works and escalates tickets.
    Engineer = 2,
    /// L3: assigns, reviews rejections and closes out.
    Manager = 3,
}

impl PermissionLevel {
    /// Numeric value as stored in the database.
    pub fn value(self) -> i16 {
        self as i16
    }

    /// Map a stored value to a tier. Out-of-range values clamp to the
    /// nearest tier.
    pub fn from_value(value: i16) -> Self {
        match value {
            i16::MIN..=1 => Self::Operator,
            2 => Self::Engineer,
            _ => Self::Manager,
        }
    }

    /// Validate a value coming from an API request.
    pub fn parse(value: i16) -> Result<Self, mafs_core::AppError> {
        match value {
            1 => Ok(Self::Operator),
            2 => Ok(Self::Engineer),
            3 => Ok(Self::Manager),
            _ => Err(mafs_core::AppError::validation(format!(
                "Invalid permission level {value}. Expected 1, 2 or 3"
            ))),
        }
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.value())
    }
}
