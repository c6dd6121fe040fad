//! Authentication service: password login, LINE login, bearer-token
//! resolution and the first-start admin account.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use mafs_auth::{JwtDecoder, JwtEncoder, PasswordHasher, RequestContext};
use mafs_core::error::AppError;
use mafs_core::result::AppResult;
use mafs_database::store::{PermissionStore, UserStore};
use mafs_entity::user::{ADMIN_GROUP, CreateUser, PermissionLevel, User};
use mafs_messaging::ProfileResolver;

/// Username of the account created on first start.
pub const BOOTSTRAP_ADMIN_USERNAME: &str = "admin";

/// Result of a successful login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    /// Bearer token.
    pub token: String,
    /// Token expiry.
    pub expires_at: DateTime<Utc>,
    /// The logged-in user.
    pub user: User,
}

/// Issues and resolves bearer tokens.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    permissions: Arc<dyn PermissionStore>,
    hasher: Arc<PasswordHasher>,
    encoder: Arc<JwtEncoder>,
    decoder: Arc<JwtDecoder>,
    profiles: Arc<dyn ProfileResolver>,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService").finish()
    }
}

impl AuthService {
    /// Creates a new auth service.
    pub fn new(
        users: Arc<dyn UserStore>,
        permissions: Arc<dyn PermissionStore>,
        hasher: Arc<PasswordHasher>,
        encoder: Arc<JwtEncoder>,
        decoder: Arc<JwtDecoder>,
        profiles: Arc<dyn ProfileResolver>,
    ) -> Self {
        Self {
            users,
            permissions,
            hasher,
            encoder,
            decoder,
            profiles,
        }
    }

    /// Logs in with a username or person number and a password.
    ///
    /// Unknown login, wrong password and inactive account all produce the
    /// same message.
    pub async fn login(&self, login: &str, password: &str) -> AppResult<LoginResult> {
        let invalid = || AppError::authentication("Invalid username or password");

        let user = self
            .users
            .find_by_login(login.trim())
            .await?
            .ok_or_else(invalid)?;

        if !self.hasher.verify_password(password, &user.password_hash)? {
            warn!(user_id = user.id, "Login failed: wrong password");
            return Err(invalid());
        }
        if !user.is_active {
            warn!(user_id = user.id, "Login refused: account inactive");
            return Err(invalid());
        }

        self.finish_login(user).await
    }

    /// Logs in the user linked to the LINE account behind a LIFF token.
    pub async fn line_login(&self, access_token: &str) -> AppResult<LoginResult> {
        let profile = self.profiles.resolve(access_token).await?;

        let user = self
            .users
            .find_by_line_id(&profile.user_id)
            .await?
            .ok_or_else(|| {
                AppError::authentication("This LINE account is not linked to a user")
                    .with_code("LINE_NOT_LINKED")
            })?;
        if !user.is_active {
            return Err(AppError::authentication("Account is inactive"));
        }

        self.finish_login(user).await
    }

    async fn finish_login(&self, user: User) -> AppResult<LoginResult> {
        let issued = self.encoder.issue(&user)?;
        self.users.touch_login(user.id).await?;

        info!(user_id = user.id, username = %user.username, "User logged in");

        Ok(LoginResult {
            token: issued.token,
            expires_at: issued.expires_at,
            user,
        })
    }

    /// Resolves a bearer token into the caller's context.
    ///
    /// The user is reloaded so deactivation takes effect immediately.
    pub async fn authenticate(&self, token: &str) -> AppResult<RequestContext> {
        let claims = self.decoder.decode(token)?;

        let user = self
            .users
            .find_by_id(claims.user_id())
            .await?
            .ok_or_else(|| AppError::authentication("User no longer exists"))?;
        if !user.is_active {
            return Err(AppError::authentication("Account is inactive"));
        }

        let permissions = self.permissions.for_group(&user.group_code).await?;
        Ok(RequestContext::new(user, permissions))
    }

    /// Creates the `admin` account when no users exist yet.
    ///
    /// Returns whether an account was created.
    pub async fn ensure_bootstrap_admin(&self, password: Option<&str>) -> AppResult<bool> {
        if self.users.count().await? > 0 {
            return Ok(false);
        }
        let Some(password) = password.filter(|p| !p.is_empty()) else {
            warn!("No users exist and no bootstrap admin password is configured");
            return Ok(false);
        };

        let admin = self
            .users
            .create(CreateUser {
                person_no: "ADMIN".to_string(),
                username: BOOTSTRAP_ADMIN_USERNAME.to_string(),
                display_name: "Administrator".to_string(),
                email: None,
                department: None,
                group_code: ADMIN_GROUP.to_string(),
                permission_level: PermissionLevel::Manager,
                password_hash: self.hasher.hash_password(password)?,
            })
            .await?;

        info!(user_id = admin.id, "Bootstrap admin account created");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use mafs_core::config::AuthConfig;
    use mafs_core::error::ErrorKind;
    use mafs_entity::user::UpdateUser;
    use mafs_messaging::StaticProfiles;

    use super::*;
    use crate::testing;

    fn service(stores: &mafs_database::Stores) -> AuthService {
        let config = AuthConfig::default();
        AuthService::new(
            Arc::clone(&stores.users),
            Arc::clone(&stores.permissions),
            Arc::new(PasswordHasher::new()),
            Arc::new(JwtEncoder::new(&config)),
            Arc::new(JwtDecoder::new(&config)),
            Arc::new(StaticProfiles::new().with("liff-ok", "U-linked", "Linked")),
        )
    }

    #[tokio::test]
    async fn test_bootstrap_then_login() {
        let (_, stores) = testing::stores();
        let auth = service(&stores);

        assert!(auth.ensure_bootstrap_admin(Some("first-start")).await.unwrap());
        assert!(!auth.ensure_bootstrap_admin(Some("again")).await.unwrap());

        let result = auth.login("admin", "first-start").await.unwrap();
        assert!(result.user.is_admin());

        let ctx = auth.authenticate(&result.token).await.unwrap();
        assert_eq!(ctx.user_id(), result.user.id);
        assert!(ctx.user.last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_wrong_password_is_authentication_error() {
        let (_, stores) = testing::stores();
        let auth = service(&stores);
        auth.ensure_bootstrap_admin(Some("first-start")).await.unwrap();

        let err = auth.login("admin", "nope").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
        let err = auth.login("ghost", "first-start").await.unwrap_err();
        assert_eq!(err.message, "Invalid username or password");
    }

    #[tokio::test]
    async fn test_deactivated_user_token_is_rejected() {
        let (_, stores) = testing::stores();
        let auth = service(&stores);
        auth.ensure_bootstrap_admin(Some("first-start")).await.unwrap();
        let result = auth.login("admin", "first-start").await.unwrap();

        stores
            .users
            .update(
                result.user.id,
                UpdateUser {
                    is_active: Some(false),
                    ..UpdateUser::default()
                },
            )
            .await
            .unwrap();

        let err = auth.authenticate(&result.token).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
    }

    #[tokio::test]
    async fn test_line_login_requires_linked_account() {
        let (_, stores) = testing::stores();
        let auth = service(&stores);

        let err = auth.line_login("liff-ok").await.unwrap_err();
        assert_eq!(err.code, Some("LINE_NOT_LINKED"));

        testing::user(
            &stores,
            "somchai",
            "OPERATOR",
            PermissionLevel::Operator,
            Some("U-linked"),
        )
        .await;
        let result = auth.line_login("liff-ok").await.unwrap();
        assert_eq!(result.user.username, "somchai");

        assert!(auth.line_login("liff-bad").await.is_err());
    }
}
