//! Form permission actions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Actions a group may be granted on a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormAction {
    /// Read access.
    View,
    /// Create records.
    Create,
    /// Modify records.
    Update,
    /// Remove records.
    Delete,
}

impl FormAction {
    /// Return the action as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for FormAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormAction {
    type Err = mafs_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "view" => Ok(Self::View),
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            _ => Err(mafs_core::AppError::validation(format!(
                "Invalid form action: '{s}'. Expected one of: view, create, update, delete"
            ))),
        }
    }
}
