//! Notification schedule handlers.

use axum::Json;
use axum::extract::{Path, State};

use mafs_auth::require_group;
use mafs_core::error::AppError;
use mafs_entity::schedule::NotificationKind;
use mafs_entity::user::ADMIN_GROUP;

use crate::dto::request::UpdateScheduleRequest;
use crate::dto::response::{ApiResponse, RunResponse, ScheduleUpdateResponse, ScheduleView};
use crate::extractors::{AuthUser, ValidJson};
use crate::state::AppState;

/// GET /api/admin/notification-schedules
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<ScheduleView>>>, AppError> {
    require_group(&auth, &[ADMIN_GROUP])?;

    let statuses = state.scheduler.statuses().await;
    let views = state
        .scheduler
        .schedules()
        .await?
        .into_iter()
        .map(|schedule| {
            let job = statuses
                .iter()
                .find(|s| s.notification_type.as_str() == schedule.notification_type)
                .cloned();
            ScheduleView { schedule, job }
        })
        .collect();
    Ok(Json(ApiResponse::ok(views)))
}

/// PUT /api/admin/notification-schedules/{type}
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(kind): Path<String>,
    ValidJson(req): ValidJson<UpdateScheduleRequest>,
) -> Result<Json<ApiResponse<ScheduleUpdateResponse>>, AppError> {
    require_group(&auth, &[ADMIN_GROUP])?;
    let kind: NotificationKind = kind.parse()?;

    let (schedule, job) = state.scheduler.update_schedule(kind, req.into()).await?;
    tracing::info!(admin_id = auth.user_id(), kind = %kind, "Notification schedule edited");
    Ok(Json(ApiResponse::ok(ScheduleUpdateResponse { schedule, job })))
}

/// POST /api/admin/notification-schedules/{type}/run
pub async fn run(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(kind): Path<String>,
) -> Result<Json<ApiResponse<RunResponse>>, AppError> {
    require_group(&auth, &[ADMIN_GROUP])?;
    let kind: NotificationKind = kind.parse()?;

    let outcome = state.scheduler.run_now(kind).await?;
    Ok(Json(ApiResponse::ok(RunResponse {
        notification_type: kind.as_str().to_string(),
        outcome,
    })))
}
