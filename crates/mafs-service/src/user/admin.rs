//! Administrative user management.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use mafs_auth::{
    PasswordHasher, PasswordValidator, RequestContext, require_form, require_group, require_level,
};
use mafs_core::error::AppError;
use mafs_core::result::AppResult;
use mafs_core::types::{PageRequest, PageResponse};
use mafs_database::store::UserStore;
use mafs_entity::permission::{FormAction, forms};
use mafs_entity::user::{ADMIN_GROUP, CreateUser, PermissionLevel, UpdateUser, User, UserSummary};

/// Data for creating a user account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserRequest {
    /// Employee number.
    pub person_no: String,
    /// Login name.
    pub username: String,
    /// Display name.
    pub display_name: String,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Department.
    #[serde(default)]
    pub department: Option<String>,
    /// Group code.
    pub group_code: String,
    /// Workflow tier, 1 to 3.
    pub permission_level: i16,
    /// Initial password; LINE-only accounts may omit it.
    #[serde(default)]
    pub password: Option<String>,
}

/// User administration for the ADMIN group.
#[derive(Clone)]
pub struct AdminUserService {
    users: Arc<dyn UserStore>,
    hasher: Arc<PasswordHasher>,
    validator: Arc<PasswordValidator>,
}

impl std::fmt::Debug for AdminUserService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminUserService").finish()
    }
}

impl AdminUserService {
    /// Creates a new admin user service.
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: Arc<PasswordHasher>,
        validator: Arc<PasswordValidator>,
    ) -> Self {
        Self {
            users,
            hasher,
            validator,
        }
    }

    /// Lists users (form `users`, view).
    pub async fn list(
        &self,
        ctx: &RequestContext,
        search: Option<&str>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<User>> {
        require_form(ctx, forms::USERS, FormAction::View)?;
        self.users.list(search, page).await
    }

    /// Active engineers and managers for assignment pickers (L2+).
    pub async fn engineers(&self, ctx: &RequestContext) -> AppResult<Vec<UserSummary>> {
        require_level(ctx, PermissionLevel::Engineer)?;
        let users = self
            .users
            .list_active_at_level(PermissionLevel::Engineer.value())
            .await?;
        Ok(users.iter().map(User::summary).collect())
    }

    /// Creates a user account.
    pub async fn create(&self, ctx: &RequestContext, req: NewUserRequest) -> AppResult<User> {
        require_group(ctx, &[ADMIN_GROUP])?;

        let username = req.username.trim().to_string();
        let person_no = req.person_no.trim().to_string();
        if username.is_empty() || person_no.is_empty() || req.display_name.trim().is_empty() {
            return Err(AppError::validation(
                "Username, person number and display name are required",
            ));
        }
        let group_code = req.group_code.trim().to_uppercase();
        if group_code.is_empty() {
            return Err(AppError::validation("Group code is required"));
        }
        let level = PermissionLevel::parse(req.permission_level)?;

        let password_hash = match req.password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => {
                self.validator.validate(password)?;
                self.hasher.hash_password(password)?
            }
            None => String::new(),
        };

        let user = self
            .users
            .create(CreateUser {
                person_no,
                username,
                display_name: req.display_name.trim().to_string(),
                email: req.email.filter(|e| !e.is_empty()),
                department: req.department.filter(|d| !d.is_empty()),
                group_code,
                permission_level: level,
                password_hash,
            })
            .await?;

        info!(admin_id = ctx.user_id(), user_id = user.id, "User created");
        Ok(user)
    }

    /// Updates a user account.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: i64,
        mut data: UpdateUser,
    ) -> AppResult<User> {
        require_group(ctx, &[ADMIN_GROUP])?;

        if id == ctx.user_id() && data.is_active == Some(false) {
            return Err(AppError::validation("You cannot deactivate your own account"));
        }
        if let Some(group) = data.group_code.as_mut() {
            *group = group.trim().to_uppercase();
            if group.is_empty() {
                return Err(AppError::validation("Group code cannot be empty"));
            }
        }

        let user = self.users.update(id, data).await?;
        info!(admin_id = ctx.user_id(), user_id = user.id, "User updated");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use mafs_core::error::ErrorKind;

    use super::*;
    use crate::testing;

    fn service(stores: &mafs_database::Stores) -> AdminUserService {
        AdminUserService::new(
            Arc::clone(&stores.users),
            Arc::new(PasswordHasher::new()),
            Arc::new(PasswordValidator::new(8)),
        )
    }

    fn request(username: &str, level: i16) -> NewUserRequest {
        NewUserRequest {
            person_no: format!("P-{username}"),
            username: username.into(),
            display_name: username.into(),
            email: None,
            department: None,
            group_code: "engineer".into(),
            permission_level: level,
            password: Some("initial-pass".into()),
        }
    }

    #[tokio::test]
    async fn test_only_admin_creates_users() {
        let (_, stores) = testing::stores();
        let manager = testing::user(&stores, "mgr", "MANAGER", PermissionLevel::Manager, None).await;
        let admin = testing::user(&stores, "root", ADMIN_GROUP, PermissionLevel::Manager, None).await;
        let svc = service(&stores);

        let err = svc
            .create(&testing::ctx(&stores, &manager).await, request("x", 2))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);

        let created = svc
            .create(&testing::ctx(&stores, &admin).await, request("x", 2))
            .await
            .unwrap();
        assert_eq!(created.group_code, "ENGINEER");
        assert!(created.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_invalid_level_rejected() {
        let (_, stores) = testing::stores();
        let admin = testing::user(&stores, "root", ADMIN_GROUP, PermissionLevel::Manager, None).await;
        let err = service(&stores)
            .create(&testing::ctx(&stores, &admin).await, request("y", 7))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_engineers_requires_level_two() {
        let (_, stores) = testing::stores();
        let op = testing::user(&stores, "op", "OPERATOR", PermissionLevel::Operator, None).await;
        let eng = testing::user(&stores, "eng", "ENGINEER", PermissionLevel::Engineer, None).await;
        let svc = service(&stores);

        assert!(svc.engineers(&testing::ctx(&stores, &op).await).await.is_err());
        let list = svc.engineers(&testing::ctx(&stores, &eng).await).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, eng.id);
    }

    #[tokio::test]
    async fn test_operator_cannot_list_users() {
        let (_, stores) = testing::stores();
        let op = testing::user(&stores, "op", "OPERATOR", PermissionLevel::Operator, None).await;
        let err = service(&stores)
            .list(&testing::ctx(&stores, &op).await, None, &PageRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
    }
}
