//! CORS layer configuration.

use std::time::Duration;

use axum::http::{HeaderValue, Method};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use tower_http::cors::{Any, CorsLayer};

use mafs_core::config::ServerConfig;

/// Builds a CORS tower layer from configuration.
///
/// The configured frontend URL is always allowed alongside the listed
/// origins; `*` allows any origin.
pub fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let layer = CorsLayer::new()
        .allow_methods(methods)
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(config.cors.max_age_seconds));

    if config.cors.allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors
        .allowed_origins
        .iter()
        .chain(std::iter::once(&config.frontend_url))
        .filter_map(|o| o.trim_end_matches('/').parse().ok())
        .collect();
    layer.allow_origin(origins)
}
