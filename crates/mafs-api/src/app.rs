//! Application builder: wires router, middleware and state into an Axum app.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware as axum_middleware;
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::cors::build_cors_layer;
use crate::middleware::error_detail::expose_error_details;
use crate::middleware::logging::request_logging;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
///
/// Stored uploads are served read-only under `/uploads`.
pub fn build_app(state: AppState) -> Router {
    let config = Arc::clone(&state.config);
    let uploads = ServeDir::new(&config.uploads.root);

    build_router()
        .nest_service("/uploads", uploads)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            expose_error_details,
        ))
        .layer(DefaultBodyLimit::max(config.uploads.body_limit()))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_seconds,
        )))
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&config.server))
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(request_logging))
        .with_state(state)
}
