//! Ticket handlers: listing, reporting, editing, workflow and comments.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use bytes::Bytes;

use mafs_core::error::AppError;
use mafs_core::types::PageResponse;
use mafs_entity::ticket::{Ticket, TicketAction, TicketComment, TicketHistory};
use mafs_service::WorkflowRequest;
use mafs_service::ticket::{CreateTicketRequest, TicketDetail, UpdateTicketRequest};

use crate::dto::request::{CommentRequest, TicketListParams};
use crate::dto::response::ApiResponse;
use crate::extractors::{AuthUser, ValidJson};
use crate::state::AppState;

/// GET /api/tickets
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<TicketListParams>,
) -> Result<Json<ApiResponse<PageResponse<Ticket>>>, AppError> {
    let (query, page) = params.into_parts();
    let tickets = state
        .ticket_service
        .list(&auth, query, &page.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(tickets)))
}

/// POST /api/tickets
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Ticket>>), AppError> {
    let ticket = state.ticket_service.create(&auth, req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(ticket))))
}

/// GET /api/tickets/{id}
pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<TicketDetail>>, AppError> {
    let detail = state.ticket_service.detail(&auth, id).await?;
    Ok(Json(ApiResponse::ok(detail)))
}

/// PUT /api/tickets/{id}
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTicketRequest>,
) -> Result<Json<ApiResponse<Ticket>>, AppError> {
    let ticket = state.ticket_service.update(&auth, id, req).await?;
    Ok(Json(ApiResponse::ok(ticket)))
}

/// POST /api/tickets/{id}/{action}
///
/// The body is optional; actions without inputs accept an empty request.
pub async fn perform(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, action)): Path<(i64, String)>,
    body: Bytes,
) -> Result<Json<ApiResponse<Ticket>>, AppError> {
    let action = parse_action(&action)?;
    let req = if body.iter().all(u8::is_ascii_whitespace) {
        WorkflowRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::validation(format!("Invalid request body: {e}")))?
    };
    let ticket = state.ticket_service.perform(&auth, id, action, req).await?;
    Ok(Json(ApiResponse::with_message(
        ticket,
        format!("Ticket moved to {}", action.target()),
    )))
}

/// Accepts `review_reject` and `review-reject` alike.
fn parse_action(raw: &str) -> Result<TicketAction, AppError> {
    let normalized = raw.replace('-', "_");
    serde_json::from_value(serde_json::Value::String(normalized))
        .map_err(|_| AppError::not_found(format!("Unknown ticket action '{raw}'")))
}

/// GET /api/tickets/{id}/comments
pub async fn comments(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<TicketComment>>>, AppError> {
    let comments = state.ticket_service.comments(&auth, id).await?;
    Ok(Json(ApiResponse::ok(comments)))
}

/// POST /api/tickets/{id}/comments
pub async fn add_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    ValidJson(req): ValidJson<CommentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TicketComment>>), AppError> {
    let comment = state.ticket_service.add_comment(&auth, id, &req.body).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(comment))))
}

/// GET /api/tickets/{id}/history
pub async fn history(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<TicketHistory>>>, AppError> {
    let history = state.ticket_service.history(&auth, id).await?;
    Ok(Json(ApiResponse::ok(history)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action() {
        assert_eq!(parse_action("accept").unwrap(), TicketAction::Accept);
        assert_eq!(parse_action("review-reject").unwrap(), TicketAction::ReviewReject);
        assert!(parse_action("explode").is_err());
    }
}
