//! Request DTOs with validation.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use mafs_core::error::AppError;
use mafs_entity::dashboard::DashboardFilter;
use mafs_entity::hierarchy::NewProductionUnit;
use mafs_entity::schedule::ScheduleUpdate;
use mafs_entity::ticket::{Priority, Severity, TicketFilter, TicketStatus};
use mafs_entity::user::{PermissionLevel, UpdateProfile, UpdateUser};
use mafs_service::ticket::TicketListQuery;
use mafs_service::user::NewUserRequest;

use crate::extractors::PaginationParams;

/// Login request body. `username` also matches the person number.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username or person number.
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// LINE login request body.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LineLoginRequest {
    /// LIFF access token.
    #[serde(alias = "accessToken")]
    #[validate(length(min = 1, message = "Access token is required"))]
    pub access_token: String,
}

/// Password change request.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    /// Current password.
    #[serde(alias = "current_password")]
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    /// New password; length policy is enforced by the service.
    #[serde(alias = "new_password")]
    #[validate(length(min = 1, message = "New password is required"))]
    pub new_password: String,
}

/// Self-service profile update.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    /// Display name.
    #[validate(length(max = 100, message = "Display name is too long"))]
    pub display_name: Option<String>,
    /// Email.
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    /// Department.
    pub department: Option<String>,
}

impl From<UpdateProfileRequest> for UpdateProfile {
    fn from(req: UpdateProfileRequest) -> Self {
        Self {
            display_name: req.display_name,
            email: req.email,
            department: req.department,
        }
    }
}

/// Link or unlink a LINE account. `null` unlinks.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkLineRequest {
    /// LINE user id.
    #[serde(default, alias = "line_id")]
    pub line_id: Option<String>,
}

/// Create user request (admin).
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    /// Employee number.
    #[validate(length(min = 1, max = 50, message = "Person number is required"))]
    pub person_no: String,
    /// Login name.
    #[validate(length(min = 3, max = 100, message = "Username must be 3 to 100 characters"))]
    pub username: String,
    /// Display name.
    #[validate(length(min = 1, max = 100, message = "Display name is required"))]
    pub display_name: String,
    /// Email.
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    /// Department.
    pub department: Option<String>,
    /// Group code.
    #[validate(length(min = 1, message = "Group code is required"))]
    pub group_code: String,
    /// Workflow tier, 1 to 3.
    #[validate(range(min = 1, max = 3, message = "Permission level must be 1, 2 or 3"))]
    pub permission_level: i16,
    /// Initial password.
    pub password: Option<String>,
}

impl From<CreateUserRequest> for NewUserRequest {
    fn from(req: CreateUserRequest) -> Self {
        Self {
            person_no: req.person_no,
            username: req.username,
            display_name: req.display_name,
            email: req.email,
            department: req.department,
            group_code: req.group_code,
            permission_level: req.permission_level,
            password: req.password,
        }
    }
}

/// Update user request (admin). Omitted fields are unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
    pub group_code: Option<String>,
    pub permission_level: Option<i16>,
    pub is_active: Option<bool>,
}

impl TryFrom<UpdateUserRequest> for UpdateUser {
    type Error = AppError;

    fn try_from(req: UpdateUserRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            display_name: req.display_name,
            email: req.email,
            department: req.department,
            group_code: req.group_code,
            permission_level: req.permission_level.map(PermissionLevel::parse).transpose()?,
            is_active: req.is_active,
        })
    }
}

/// User listing query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListParams {
    /// Name, username or person number fragment.
    pub search: Option<String>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

impl UserListParams {
    /// The page part of the query.
    pub fn page(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

/// Ticket listing query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketListParams {
    pub status: Option<TicketStatus>,
    pub assigned_to: Option<i64>,
    pub created_by: Option<i64>,
    pub pu_id: Option<i64>,
    pub severity: Option<Severity>,
    pub priority: Option<Priority>,
    pub search: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// Only tickets the caller reported or handles.
    #[serde(default)]
    pub mine: bool,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}

impl TicketListParams {
    /// Splits into the service query and the page request.
    pub fn into_parts(self) -> (TicketListQuery, PaginationParams) {
        let filter = TicketFilter {
            status: self.status,
            assigned_to: self.assigned_to,
            created_by: self.created_by,
            pu_id: self.pu_id,
            severity: self.severity,
            priority: self.priority,
            search: self.search.filter(|s| !s.trim().is_empty()),
            from: self.from,
            to: self.to,
            involving: None,
        };
        (
            TicketListQuery {
                filter,
                mine: self.mine,
            },
            PaginationParams {
                page: self.page,
                per_page: self.per_page,
            },
        )
    }
}

/// Comment body.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CommentRequest {
    /// Comment text.
    #[validate(length(min = 1, max = 2000, message = "Comment must be 1 to 2000 characters"))]
    pub body: String,
}

/// Dashboard window query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardParams {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub plant: Option<String>,
    /// Row limit for ranked lists.
    pub limit: Option<i64>,
}

impl DashboardParams {
    /// The filter part of the query.
    pub fn filter(&self) -> DashboardFilter {
        DashboardFilter {
            from: self.from,
            to: self.to,
            plant: self.plant.clone().filter(|p| !p.trim().is_empty()),
        }
    }
}

/// Production unit search query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UnitSearchParams {
    pub search: Option<String>,
    pub limit: Option<i64>,
}

/// Production unit registration.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUnitRequest {
    #[validate(length(min = 1, max = 20))]
    pub plant: String,
    #[validate(length(min = 1, max = 20))]
    pub area: String,
    #[validate(length(min = 1, max = 20))]
    pub line: String,
    #[validate(length(min = 1, max = 20))]
    pub machine: String,
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
}

impl From<CreateUnitRequest> for NewProductionUnit {
    fn from(req: CreateUnitRequest) -> Self {
        Self {
            plant: req.plant,
            area: req.area,
            line: req.line,
            machine: req.machine,
            name: req.name,
        }
    }
}

/// Notification schedule edit.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScheduleRequest {
    /// Cron expression, 5 or 6 fields.
    #[serde(alias = "schedule_cron")]
    #[validate(length(min = 1, message = "Cron expression is required"))]
    pub schedule_cron: String,
    /// IANA timezone; null or empty means UTC.
    #[serde(default)]
    pub timezone: Option<String>,
    /// Arm the job.
    #[serde(alias = "is_enabled")]
    pub is_enabled: bool,
}

impl From<UpdateScheduleRequest> for ScheduleUpdate {
    fn from(req: UpdateScheduleRequest) -> Self {
        Self {
            schedule_cron: req.schedule_cron,
            timezone: req.timezone,
            is_enabled: req.is_enabled,
        }
    }
}
