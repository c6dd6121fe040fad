//! Reading and editing the per-group form permission matrix.

use std::sync::Arc;

use tracing::info;

use mafs_auth::{RequestContext, require_group};
use mafs_core::error::AppError;
use mafs_core::result::AppResult;
use mafs_database::store::PermissionStore;
use mafs_entity::permission::{FormPermission, forms};
use mafs_entity::user::ADMIN_GROUP;

const KNOWN_FORMS: [&str; 4] = [forms::TICKETS, forms::DASHBOARD, forms::HIERARCHY, forms::USERS];

/// Form permission administration for the ADMIN group.
#[derive(Clone)]
pub struct FormPermissionService {
    permissions: Arc<dyn PermissionStore>,
}

impl std::fmt::Debug for FormPermissionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormPermissionService").finish()
    }
}

impl FormPermissionService {
    /// Creates a new form permission service.
    pub fn new(permissions: Arc<dyn PermissionStore>) -> Self {
        Self { permissions }
    }

    /// All rows, ordered by group then form.
    pub async fn list(&self, ctx: &RequestContext) -> AppResult<Vec<FormPermission>> {
        require_group(ctx, &[ADMIN_GROUP])?;
        self.permissions.list().await
    }

    /// Inserts or replaces rows. Every row is checked before any is written.
    pub async fn upsert(
        &self,
        ctx: &RequestContext,
        rows: Vec<FormPermission>,
    ) -> AppResult<Vec<FormPermission>> {
        require_group(ctx, &[ADMIN_GROUP])?;

        let rows = rows
            .into_iter()
            .map(normalize)
            .collect::<AppResult<Vec<_>>>()?;
        for row in &rows {
            self.permissions.upsert(row).await?;
        }

        info!(admin_id = ctx.user_id(), rows = rows.len(), "Form permissions updated");
        self.permissions.list().await
    }
}

fn normalize(mut row: FormPermission) -> AppResult<FormPermission> {
    row.group_code = row.group_code.trim().to_uppercase();
    row.form_code = row.form_code.trim().to_lowercase();
    if row.group_code.is_empty() {
        return Err(AppError::validation("Group code is required"));
    }
    if row.group_code == ADMIN_GROUP {
        return Err(AppError::validation("ADMIN always has every permission"));
    }
    if !KNOWN_FORMS.contains(&row.form_code.as_str()) {
        return Err(AppError::validation(format!(
            "Unknown form '{}'. Expected one of: {}",
            row.form_code,
            KNOWN_FORMS.join(", ")
        )));
    }
    Ok(row)
}
