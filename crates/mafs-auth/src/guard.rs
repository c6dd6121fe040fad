//! Per-request permission context and guards.
//!
//! Every guard lets the `ADMIN` group through. Failures are authorization
//! errors and render as 403.

use mafs_core::error::AppError;
use mafs_entity::permission::{FormAction, FormPermission};
use mafs_entity::user::{PermissionLevel, User};

/// The authenticated caller together with its group's form permissions.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// The caller, freshly loaded from the store.
    pub user: User,
    /// Form permission rows of the caller's group.
    pub permissions: Vec<FormPermission>,
}

impl RequestContext {
    /// Builds a context for `user`.
    pub fn new(user: User, permissions: Vec<FormPermission>) -> Self {
        Self { user, permissions }
    }

    /// Caller's user ID.
    pub fn user_id(&self) -> i64 {
        self.user.id
    }

    /// Whether the caller belongs to the `ADMIN` group.
    pub fn is_admin(&self) -> bool {
        self.user.is_admin()
    }

    /// Caller's permission level.
    pub fn level(&self) -> PermissionLevel {
        self.user.level()
    }

    /// Whether the caller's level is at least `min` (admins always are).
    pub fn has_level(&self, min: PermissionLevel) -> bool {
        self.is_admin() || self.level() >= min
    }

    /// Whether the caller's group may perform `action` on `form`.
    pub fn can(&self, form: &str, action: FormAction) -> bool {
        self.is_admin()
            || self
                .permissions
                .iter()
                .any(|p| p.form_code.eq_ignore_ascii_case(form) && p.allows(action))
    }
}

/// Requires the caller to belong to one of `groups`.
pub fn require_group(ctx: &RequestContext, groups: &[&str]) -> Result<(), AppError> {
    if ctx.is_admin()
        || groups
            .iter()
            .any(|g| g.eq_ignore_ascii_case(&ctx.user.group_code))
    {
        return Ok(());
    }
    tracing::debug!(user_id = ctx.user.id, group = %ctx.user.group_code, "Group check failed");
    Err(AppError::authorization(
        "You do not have permission to perform this action",
    ))
}

/// Requires the caller's permission level to be at least `min`.
pub fn require_level(ctx: &RequestContext, min: PermissionLevel) -> Result<(), AppError> {
    if ctx.has_level(min) {
        return Ok(());
    }
    Err(AppError::authorization(format!(
        "This action requires permission level {min} or higher"
    )))
}

/// Requires the caller's group to hold `action` on `form`.
pub fn require_form(ctx: &RequestContext, form: &str, action: FormAction) -> Result<(), AppError> {
    if ctx.can(form, action) {
        return Ok(());
    }
    tracing::debug!(
        user_id = ctx.user.id,
        form,
        action = action.as_str(),
        "Form permission check failed"
    );
    Err(AppError::authorization(format!(
        "You do not have {} permission on {form}",
        action.as_str()
    )))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mafs_core::error::ErrorKind;
    use mafs_entity::permission::forms;

    use super::*;

    fn ctx(group: &str, level: i16, perms: Vec<FormPermission>) -> RequestContext {
        let now = Utc::now();
        RequestContext::new(
            User {
                id: 1,
                person_no: "P1".into(),
                username: "u".into(),
                display_name: "U".into(),
                email: None,
                department: None,
                group_code: group.into(),
                permission_level: level,
                line_id: None,
                avatar_path: None,
                is_active: true,
                password_hash: String::new(),
                created_at: now,
                updated_at: now,
                last_login_at: None,
            },
            perms,
        )
    }

    fn view_only(form: &str) -> FormPermission {
        FormPermission {
            group_code: "OPERATOR".into(),
            form_code: form.into(),
            can_view: true,
            can_create: false,
            can_update: false,
            can_delete: false,
        }
    }

    #[test]
    fn test_admin_passes_everything() {
        let c = ctx("ADMIN", 1, vec![]);
        assert!(require_group(&c, &["MANAGER"]).is_ok());
        assert!(require_level(&c, PermissionLevel::Manager).is_ok());
        assert!(require_form(&c, forms::USERS, FormAction::Delete).is_ok());
    }

    #[test]
    fn test_group_mismatch_is_forbidden() {
        let c = ctx("OPERATOR", 1, vec![]);
        let err = require_group(&c, &["ADMIN"]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
    }

    #[test]
    fn test_level_check() {
        let c = ctx("ENGINEER", 2, vec![]);
        assert!(require_level(&c, PermissionLevel::Engineer).is_ok());
        assert!(require_level(&c, PermissionLevel::Manager).is_err());
    }

    #[test]
    fn test_form_check_uses_action_flags() {
        let c = ctx("OPERATOR", 1, vec![view_only(forms::TICKETS)]);
        assert!(require_form(&c, forms::TICKETS, FormAction::View).is_ok());
        assert!(require_form(&c, forms::TICKETS, FormAction::Delete).is_err());
        assert!(require_form(&c, forms::USERS, FormAction::View).is_err());
    }
}
