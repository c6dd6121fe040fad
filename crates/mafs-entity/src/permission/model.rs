//! Form permission entity.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::action::FormAction;

/// Well-known form codes.
pub mod forms {
    /// Ticket list and detail pages.
    pub const TICKETS: &str = "tickets";
    /// KPI dashboard.
    pub const DASHBOARD: &str = "dashboard";
    /// Production unit hierarchy maintenance.
    pub const HIERARCHY: &str = "hierarchy";
    /// User administration.
    pub const USERS: &str = "users";
}

/// Action flags granted to one group on one form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FormPermission {
    /// Group code.
    pub group_code: String,
    /// Form code.
    pub form_code: String,
    /// May view.
    pub can_view: bool,
    /// May create.
    pub can_create: bool,
    /// May update.
    pub can_update: bool,
    /// May delete.
    pub can_delete: bool,
}

impl FormPermission {
    /// Check whether this row grants the given action.
    pub fn allows(&self, action: FormAction) -> bool {
        match action {
            FormAction::View => self.can_view,
            FormAction::Create => self.can_create,
            FormAction::Update => self.can_update,
            FormAction::Delete => self.can_delete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_checks_matching_flag() {
        let perm = FormPermission {
            group_code: "OPERATOR".into(),
            form_code: forms::TICKETS.into(),
            can_view: true,
            can_create: true,
            can_update: false,
            can_delete: false,
        };
        assert!(perm.allows(FormAction::View));
        assert!(perm.allows(FormAction::Create));
        assert!(!perm.allows(FormAction::Delete));
    }
}
