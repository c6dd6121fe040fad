//! KPI dashboard handlers.

use axum::Json;
use axum::extract::{Query, State};

use mafs_core::error::AppError;
use mafs_entity::dashboard::{DashboardSummary, ReporterCount, TrendPoint};

use crate::dto::request::DashboardParams;
use crate::dto::response::ApiResponse;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/dashboard/summary
pub async fn summary(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<DashboardParams>,
) -> Result<Json<ApiResponse<DashboardSummary>>, AppError> {
    let summary = state.dashboard_service.summary(&auth, params.filter()).await?;
    Ok(Json(ApiResponse::ok(summary)))
}

/// GET /api/dashboard/trend
pub async fn trend(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<DashboardParams>,
) -> Result<Json<ApiResponse<Vec<TrendPoint>>>, AppError> {
    let points = state.dashboard_service.trend(&auth, params.filter()).await?;
    Ok(Json(ApiResponse::ok(points)))
}

/// GET /api/dashboard/top-reporters
pub async fn top_reporters(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<DashboardParams>,
) -> Result<Json<ApiResponse<Vec<ReporterCount>>>, AppError> {
    let reporters = state
        .dashboard_service
        .top_reporters(&auth, params.filter(), params.limit)
        .await?;
    Ok(Json(ApiResponse::ok(reporters)))
}
