//! Form permission repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use mafs_core::error::{AppError, ErrorKind};
use mafs_core::result::AppResult;
use mafs_entity::permission::FormPermission;

use crate::store::PermissionStore;

/// Repository for per-group form permission flags.
#[derive(Debug, Clone)]
pub struct PermissionRepository {
    pool: PgPool,
}

impl PermissionRepository {
    /// Create a new permission repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionStore for PermissionRepository {
    async fn for_group(&self, group_code: &str) -> AppResult<Vec<FormPermission>> {
        sqlx::query_as::<_, FormPermission>(
            "SELECT * FROM form_permissions WHERE UPPER(group_code) = UPPER($1) ORDER BY form_code",
        )
        .bind(group_code)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to load form permissions", e)
        })
    }

    async fn list(&self) -> AppResult<Vec<FormPermission>> {
        sqlx::query_as::<_, FormPermission>(
            "SELECT * FROM form_permissions ORDER BY group_code, form_code",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list form permissions", e)
        })
    }

    async fn upsert(&self, permission: &FormPermission) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO form_permissions \
             (group_code, form_code, can_view, can_create, can_update, can_delete) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (group_code, form_code) DO UPDATE SET \
             can_view = EXCLUDED.can_view, can_create = EXCLUDED.can_create, \
             can_update = EXCLUDED.can_update, can_delete = EXCLUDED.can_delete",
        )
        .bind(&permission.group_code)
        .bind(&permission.form_code)
        .bind(permission.can_view)
        .bind(permission.can_create)
        .bind(permission.can_update)
        .bind(permission.can_delete)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to save form permission", e)
        })?;
        Ok(())
    }
}
