//! User administration handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use mafs_core::error::AppError;
use mafs_core::types::PageResponse;
use mafs_entity::user::{User, UserSummary};

use crate::dto::request::{CreateUserRequest, UpdateUserRequest, UserListParams};
use crate::dto::response::ApiResponse;
use crate::extractors::{AuthUser, ValidJson};
use crate::state::AppState;

/// GET /api/users
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<UserListParams>,
) -> Result<Json<ApiResponse<PageResponse<User>>>, AppError> {
    let search = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let users = state
        .admin_user_service
        .list(&auth, search, &params.page().into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(users)))
}

/// GET /api/users/engineers
pub async fn engineers(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<UserSummary>>>, AppError> {
    let engineers = state.admin_user_service.engineers(&auth).await?;
    Ok(Json(ApiResponse::ok(engineers)))
}

/// POST /api/users
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), AppError> {
    let user = state.admin_user_service.create(&auth, req.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(user))))
}

/// PUT /api/users/{id}
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let user = state
        .admin_user_service
        .update(&auth, id, req.try_into()?)
        .await?;
    Ok(Json(ApiResponse::ok(user)))
}
