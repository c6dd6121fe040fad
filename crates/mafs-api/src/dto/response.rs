//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::Serialize;

use mafs_entity::permission::FormPermission;
use mafs_entity::schedule::NotificationSchedule;
use mafs_entity::user::User;
use mafs_worker::{ArmState, JobStatus, RunOutcome};

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Always `true`.
    pub success: bool,
    /// Optional human-readable message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
        }
    }

    /// Creates a successful response with a message.
    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data,
        }
    }
}

/// Success without data.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    /// Always `true`.
    pub success: bool,
    /// Message.
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Login response. The token sits next to `success` for the SPA.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Always `true`.
    pub success: bool,
    /// Bearer token.
    pub token: String,
    /// Token expiry.
    pub expires_at: DateTime<Utc>,
    /// The logged-in user.
    pub user: User,
}

/// The caller with its group's form permissions.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user: User,
    pub permissions: Vec<FormPermission>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Store backend name.
    pub database: &'static str,
    /// Backend reachable.
    pub database_healthy: bool,
    /// Seconds since start.
    pub uptime_seconds: u64,
}

/// Settings the SPA needs before login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicConfigResponse {
    pub liff_id: String,
    pub line_enabled: bool,
    pub frontend_url: String,
    pub max_upload_files: usize,
    pub max_upload_bytes: u64,
}

/// A schedule row with its job's live state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleView {
    #[serde(flatten)]
    pub schedule: NotificationSchedule,
    pub job: Option<JobStatus>,
}

/// A schedule row after an edit, with the result of re-arming.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleUpdateResponse {
    #[serde(flatten)]
    pub schedule: NotificationSchedule,
    pub job: ArmState,
}

/// Outcome of a manual notification run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    pub notification_type: String,
    #[serde(flatten)]
    pub outcome: RunOutcome,
}
