//! Auth handlers: login, LINE login, logout, me.

use axum::Json;
use axum::extract::State;

use mafs_core::error::AppError;
use mafs_service::LoginResult;

use crate::dto::request::{LineLoginRequest, LoginRequest};
use crate::dto::response::{ApiResponse, LoginResponse, MeResponse, MessageResponse};
use crate::extractors::{AuthUser, ValidJson};
use crate::state::AppState;

fn login_response(result: LoginResult) -> Json<LoginResponse> {
    Json(LoginResponse {
        success: true,
        token: result.token,
        expires_at: result.expires_at,
        user: result.user,
    })
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let result = state.auth_service.login(&req.username, &req.password).await?;
    Ok(login_response(result))
}

/// POST /api/auth/line-login
pub async fn line_login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LineLoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let result = state.auth_service.line_login(&req.access_token).await?;
    Ok(login_response(result))
}

/// POST /api/auth/logout
///
/// Tokens are stateless; the client discards its copy.
pub async fn logout(auth: AuthUser) -> Json<MessageResponse> {
    tracing::info!(user_id = auth.user_id(), "User logged out");
    Json(MessageResponse::new("Logged out successfully"))
}

/// GET /api/auth/me
pub async fn me(auth: AuthUser) -> Json<ApiResponse<MeResponse>> {
    let AuthUser(ctx) = auth;
    Json(ApiResponse::ok(MeResponse {
        user: ctx.user,
        permissions: ctx.permissions,
    }))
}
