//! User self-service operations: profile, password and LINE linking.

use std::sync::Arc;

use tracing::info;

use mafs_auth::{PasswordHasher, PasswordValidator, RequestContext};
use mafs_core::error::AppError;
use mafs_core::result::AppResult;
use mafs_database::store::UserStore;
use mafs_entity::user::{UpdateProfile, User};

/// Handles operations a user performs on their own account.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    hasher: Arc<PasswordHasher>,
    validator: Arc<PasswordValidator>,
}

impl std::fmt::Debug for UserService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserService").finish()
    }
}

impl UserService {
    /// Creates a new user service.
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

    /// Gets the caller's current profile.
    pub async fn get_profile(&self, ctx: &RequestContext) -> AppResult<User> {
        self.users
            .find_by_id(ctx.user_id())
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Updates the caller's display name, email or department.
    pub async fn update_profile(
        &self,
        ctx: &RequestContext,
        mut req: UpdateProfile,
    ) -> AppResult<User> {
        if let Some(display_name) = req.display_name.as_mut() {
            *display_name = display_name.trim().to_string();
            if display_name.is_empty() {
                return Err(AppError::validation("Display name cannot be empty"));
            }
        }
        if let Some(email) = req.email.as_deref() {
            if !email.is_empty() && (!email.contains('@') || !email.contains('.')) {
                return Err(AppError::validation("Invalid email format"));
            }
        }

        let user = self.users.update_profile(ctx.user_id(), req).await?;
        info!(user_id = user.id, "Profile updated");
        Ok(user)
    }

    /// Changes the caller's password after checking the current one.
    pub async fn change_password(
        &self,
        ctx: &RequestContext,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let user = self.get_profile(ctx).await?;

        if !self
            .hasher
            .verify_password(current_password, &user.password_hash)?
        {
            return Err(AppError::validation("Current password is incorrect")
                .with_code("WRONG_PASSWORD"));
        }
        self.validator.validate(new_password)?;
        if current_password == new_password {
            return Err(AppError::validation(
                "New password must differ from the current password",
            ));
        }

        let hash = self.hasher.hash_password(new_password)?;
        self.users.update_password(user.id, &hash).await?;

        info!(user_id = user.id, "Password changed");
        Ok(())
    }

    /// Links the caller to a LINE user ID, or unlinks when `None`.
    pub async fn link_line(&self, ctx: &RequestContext, line_id: Option<&str>) -> AppResult<User> {
        let line_id = line_id.map(str::trim).filter(|id| !id.is_empty());
        if let Some(id) = line_id {
            if !id.starts_with('U') {
                return Err(AppError::validation("LINE user IDs start with 'U'"));
            }
        }

        let user = self.users.set_line_id(ctx.user_id(), line_id).await?;
        info!(user_id = user.id, linked = line_id.is_some(), "LINE link updated");
        Ok(user)
    }
}
