//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::group::is_admin_group;
use super::level::PermissionLevel;

/// A registered user of the system.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user identifier.
    pub id: i64,
    /// Employee number, unique. Accepted as a login name.
    pub person_no: String,
    /// Unique login name.
    pub username: String,
    /// Human-readable display name.
    pub display_name: String,
    /// Email address (optional).
    pub email: Option<String>,
    /// Department label (optional).
    pub department: Option<String>,
    /// Group code used for form permissions.
    pub group_code: String,
    /// Workflow tier: 1, 2 or 3.
    pub permission_level: i16,
    /// LINE user id for push notifications.
    pub line_id: Option<String>,
    /// Relative path of the avatar under the upload root.
    pub avatar_path: Option<String>,
    /// Whether the account may log in.
    pub is_active: bool,
    /// Argon2 password hash.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
    /// Last successful login time.
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    /// The user's workflow tier.
    pub fn level(&self) -> PermissionLevel {
        PermissionLevel::from_value(self.permission_level)
    }

    /// Check if this user belongs to the administrator group.
    pub fn is_admin(&self) -> bool {
        is_admin_group(&self.group_code)
    }

    /// Check if the user can receive push notifications.
    pub fn is_reachable(&self) -> bool {
        self.is_active && self.line_id.as_deref().is_some_and(|id| !id.is_empty())
    }

    /// A compact projection for embedding in other payloads.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            display_name: self.display_name.clone(),
            permission_level: self.permission_level,
        }
    }
}

/// Minimal user projection (assignment pickers, ticket payloads).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    /// User ID.
    pub id: i64,
    /// Display name.
    pub display_name: String,
    /// Workflow tier.
    pub permission_level: i16,
}

/// Data required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Employee number.
    pub person_no: String,
    /// Desired username.
    pub username: String,
    /// Display name.
    pub display_name: String,
    /// Email address (optional).
    pub email: Option<String>,
    /// Department (optional).
    pub department: Option<String>,
    /// Group code.
    pub group_code: String,
    /// Workflow tier.
    pub permission_level: PermissionLevel,
    /// Pre-hashed password.
    pub password_hash: String,
}

/// Administrative changes to a user. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    /// New display name.
    pub display_name: Option<String>,
    /// New email address.
    pub email: Option<String>,
    /// New department.
    pub department: Option<String>,
    /// New group code.
    pub group_code: Option<String>,
    /// New workflow tier.
    pub permission_level: Option<PermissionLevel>,
    /// Activate or deactivate the account.
    pub is_active: Option<bool>,
}

/// Self-service profile changes. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfile {
    /// New display name.
    pub display_name: Option<String>,
    /// New email address.
    pub email: Option<String>,
    /// New department.
    pub department: Option<String>,
}
