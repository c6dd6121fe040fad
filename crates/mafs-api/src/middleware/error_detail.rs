//! Attaches hidden server-side error messages to 500 responses when the
//! configuration allows it.

use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use mafs_core::error::{ErrorBody, ErrorDetail};

use crate::state::AppState;

/// Largest error body this middleware will rewrite.
const MAX_ERROR_BODY: usize = 64 * 1024;

/// Copies the [`ErrorDetail`] extension into the body's `error` field.
pub async fn expose_error_details(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if !state.config.server.exposes_errors() {
        return response;
    }
    let Some(ErrorDetail(detail)) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_ERROR_BODY).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "Could not read error body");
            return Response::from_parts(parts, Body::empty());
        }
    };

    let body = match serde_json::from_slice::<ErrorBody>(&bytes) {
        Ok(mut error_body) => {
            error_body.error = Some(detail);
            match serde_json::to_vec(&error_body) {
                Ok(json) => Body::from(json),
                Err(_) => Body::from(bytes),
            }
        }
        Err(_) => Body::from(bytes),
    };
    parts.headers.remove(axum::http::header::CONTENT_LENGTH);
    Response::from_parts(parts, body)
}
