//! Plant hierarchy handlers. Reads need only a valid login.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use mafs_core::error::AppError;
use mafs_entity::hierarchy::{Area, Line, Machine, Plant, ProductionUnit};

use crate::dto::request::{CreateUnitRequest, UnitSearchParams};
use crate::dto::response::ApiResponse;
use crate::extractors::{AuthUser, ValidJson};
use crate::state::AppState;

/// GET /api/hierarchy/plants
pub async fn plants(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<Plant>>>, AppError> {
    Ok(Json(ApiResponse::ok(state.hierarchy_service.plants().await?)))
}

/// GET /api/hierarchy/plants/{id}/areas
pub async fn areas(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(plant_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<Area>>>, AppError> {
    Ok(Json(ApiResponse::ok(
        state.hierarchy_service.areas(plant_id).await?,
    )))
}

/// GET /api/hierarchy/areas/{id}/lines
pub async fn lines(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(area_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<Line>>>, AppError> {
    Ok(Json(ApiResponse::ok(
        state.hierarchy_service.lines(area_id).await?,
    )))
}

/// GET /api/hierarchy/lines/{id}/machines
pub async fn machines(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(line_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<Machine>>>, AppError> {
    Ok(Json(ApiResponse::ok(
        state.hierarchy_service.machines(line_id).await?,
    )))
}

/// GET /api/hierarchy/pu
pub async fn search_units(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<UnitSearchParams>,
) -> Result<Json<ApiResponse<Vec<ProductionUnit>>>, AppError> {
    let units = state
        .hierarchy_service
        .search_units(params.search.as_deref(), params.limit)
        .await?;
    Ok(Json(ApiResponse::ok(units)))
}

/// GET /api/hierarchy/pu/{pucode}
pub async fn unit_by_code(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(pucode): Path<String>,
) -> Result<Json<ApiResponse<ProductionUnit>>, AppError> {
    Ok(Json(ApiResponse::ok(
        state.hierarchy_service.unit_by_code(&pucode).await?,
    )))
}

/// POST /api/hierarchy/pu
pub async fn create_unit(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<CreateUnitRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProductionUnit>>), AppError> {
    let unit = state.hierarchy_service.create_unit(&auth, req.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(unit))))
}
