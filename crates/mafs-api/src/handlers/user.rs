//! User self-service handlers.

use axum::Json;
use axum::extract::{Multipart, State};

use mafs_core::error::AppError;
use mafs_entity::user::User;

use crate::dto::request::{ChangePasswordRequest, LinkLineRequest, UpdateProfileRequest};
use crate::dto::response::{ApiResponse, MessageResponse};
use crate::extractors::{AuthUser, ValidJson};
use crate::handlers::attachment::read_files;
use crate::state::AppState;

/// GET /api/users/me
pub async fn get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let user = state.user_service.get_profile(&auth).await?;
    Ok(Json(ApiResponse::ok(user)))
}

/// PUT /api/users/me
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let user = state.user_service.update_profile(&auth, req.into()).await?;
    Ok(Json(ApiResponse::ok(user)))
}

/// PUT /api/users/me/password
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .user_service
        .change_password(&auth, &req.current_password, &req.new_password)
        .await?;
    Ok(Json(MessageResponse::new("Password changed successfully")))
}

/// PUT /api/users/me/line
pub async fn link_line(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<LinkLineRequest>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let user = state
        .user_service
        .link_line(&auth, req.line_id.as_deref())
        .await?;
    Ok(Json(ApiResponse::ok(user)))
}

/// POST /api/users/me/avatar
pub async fn upload_avatar(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let (mut files, _) = read_files(multipart, &["file", "avatar", "files"]).await?;
    if files.len() > 1 {
        return Err(AppError::validation("Send exactly one avatar image").with_code("TOO_MANY_FILES"));
    }
    let file = files
        .pop()
        .ok_or_else(|| AppError::validation("No file uploaded").with_code("NO_FILES"))?;

    let user = state.upload_service.set_avatar(&auth, file).await?;
    Ok(Json(ApiResponse::ok(user)))
}
