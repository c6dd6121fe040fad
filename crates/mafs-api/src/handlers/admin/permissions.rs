//! Form permission matrix handlers.

use axum::Json;
use axum::extract::State;

use mafs_core::error::AppError;
use mafs_entity::permission::FormPermission;

use crate::dto::response::ApiResponse;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/admin/form-permissions
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<FormPermission>>>, AppError> {
    Ok(Json(ApiResponse::ok(state.permission_service.list(&auth).await?)))
}

/// PUT /api/admin/form-permissions
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(rows): Json<Vec<FormPermission>>,
) -> Result<Json<ApiResponse<Vec<FormPermission>>>, AppError> {
    let rows = state.permission_service.upsert(&auth, rows).await?;
    Ok(Json(ApiResponse::with_message(rows, "Form permissions updated")))
}
