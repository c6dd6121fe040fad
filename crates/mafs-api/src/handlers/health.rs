//! Health check and public configuration handlers.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{ApiResponse, HealthResponse, PublicConfigResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let database_healthy = state.stores.health_check().await;

    Json(ApiResponse::ok(HealthResponse {
        status: if database_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database: state.stores.backend(),
        database_healthy,
        uptime_seconds: state.started_at.elapsed().as_secs(),
    }))
}

/// GET /api/config/public
pub async fn public_config(State(state): State<AppState>) -> Json<ApiResponse<PublicConfigResponse>> {
    let config = &state.config;
    Json(ApiResponse::ok(PublicConfigResponse {
        liff_id: config.line.liff_id.clone(),
        line_enabled: config.line.enabled,
        frontend_url: config.server.frontend_url.clone(),
        max_upload_files: config.uploads.max_files,
        max_upload_bytes: config.uploads.max_file_size_bytes,
    }))
}
