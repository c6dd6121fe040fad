//! LINE webhook receiver.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use bytes::Bytes;
use tracing::{debug, info, warn};

use mafs_core::error::AppError;
use mafs_messaging::{WebhookPayload, verify_signature};

use crate::dto::response::MessageResponse;
use crate::state::AppState;

/// Header carrying the request signature.
const SIGNATURE_HEADER: &str = "x-line-signature";

/// POST /api/line/webhook
///
/// The signature covers the raw body, so the body is verified before it is
/// parsed.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<MessageResponse>, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !verify_signature(&state.config.line.channel_secret, &body, signature) {
        warn!(bytes = body.len(), "Rejected LINE webhook with an invalid signature");
        return Err(AppError::authentication("Invalid signature").with_code("INVALID_SIGNATURE"));
    }

    let payload: WebhookPayload = serde_json::from_slice(&body)
        .map_err(|e| AppError::validation(format!("Invalid webhook payload: {e}")))?;

    for event in &payload.events {
        match event.kind.as_str() {
            "follow" | "unfollow" => info!(
                event = %event.kind,
                line_user = event.user_id().unwrap_or("-"),
                "LINE follow state changed"
            ),
            _ => debug!(
                event = %event.kind,
                line_user = event.user_id().unwrap_or("-"),
                "LINE webhook event"
            ),
        }
    }

    Ok(Json(MessageResponse::new(format!(
        "Received {} event(s)",
        payload.events.len()
    ))))
}
