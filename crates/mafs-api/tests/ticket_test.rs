//! Ticket reporting and workflow through the HTTP layer.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

use mafs_entity::user::PermissionLevel;

async fn report(app: &helpers::TestApp, token: &str) -> i64 {
    let response = app
        .request(
            "POST",
            "/api/tickets",
            Some(json!({
                "title": "Hydraulic leak on press",
                "description": "Oil under the main cylinder",
                "pucode": "MT1-PRESS-L01-M01",
                "severity": "high"
            })),
            Some(token),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.body["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_operator_reports_ticket() {
    let app = helpers::TestApp::new().await;
    let token = app
        .login_as("op", "OPERATOR", PermissionLevel::Operator)
        .await;

    let id = report(&app, &token).await;

    let detail = app
        .request("GET", &format!("/api/tickets/{id}"), None, Some(&token))
        .await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.body["data"]["status"], "open");
    assert_eq!(detail.body["data"]["severity"], "high");
    assert!(detail.body["data"]["puId"].is_i64());
    assert!(detail.body["data"]["history"].is_array());
}

#[tokio::test]
async fn test_unknown_production_unit_is_rejected() {
    let app = helpers::TestApp::new().await;
    let token = app
        .login_as("op", "OPERATOR", PermissionLevel::Operator)
        .await;

    let response = app
        .request(
            "POST",
            "/api/tickets",
            Some(json!({ "title": "Noise", "pucode": "NOPE-NOPE" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_engineer_cannot_close_and_manager_hits_invalid_status() {
    let app = helpers::TestApp::new().await;
    let op = app
        .login_as("op", "OPERATOR", PermissionLevel::Operator)
        .await;
    let eng = app
        .login_as("eng", "ENGINEER", PermissionLevel::Engineer)
        .await;
    let mgr = app
        .login_as("mgr", "MANAGER", PermissionLevel::Manager)
        .await;
    let id = report(&app, &op).await;

    let forbidden = app
        .request("POST", &format!("/api/tickets/{id}/close"), None, Some(&eng))
        .await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let conflict = app
        .request("POST", &format!("/api/tickets/{id}/close"), None, Some(&mgr))
        .await;
    assert_eq!(conflict.status, StatusCode::CONFLICT);
    assert_eq!(conflict.body["code"], "INVALID_STATUS");
}

#[tokio::test]
async fn test_accept_complete_close_cycle() {
    let app = helpers::TestApp::new().await;
    let op = app
        .login_as("op", "OPERATOR", PermissionLevel::Operator)
        .await;
    let eng = app
        .login_as("eng", "ENGINEER", PermissionLevel::Engineer)
        .await;
    let id = report(&app, &op).await;

    let accepted = app
        .request("POST", &format!("/api/tickets/{id}/accept"), None, Some(&eng))
        .await;
    assert_eq!(accepted.status, StatusCode::OK, "{}", accepted.body);
    assert_eq!(accepted.body["data"]["status"], "in_progress");

    let completed = app
        .request(
            "POST",
            &format!("/api/tickets/{id}/complete"),
            Some(json!({ "costAvoidance": 1500.0, "downtimeHours": 2.5, "note": "Seal replaced" })),
            Some(&eng),
        )
        .await;
    assert_eq!(completed.status, StatusCode::OK, "{}", completed.body);
    assert_eq!(completed.body["data"]["status"], "resolved");

    let closed = app
        .request("POST", &format!("/api/tickets/{id}/close"), None, Some(&op))
        .await;
    assert_eq!(closed.status, StatusCode::OK, "{}", closed.body);
    assert_eq!(closed.body["data"]["status"], "closed");

    let history = app
        .request("GET", &format!("/api/tickets/{id}/history"), None, Some(&op))
        .await;
    assert_eq!(history.status, StatusCode::OK);
    let actions: Vec<_> = history.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["action"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(actions, ["create", "accept", "complete", "close"]);
}

#[tokio::test]
async fn test_unknown_action_and_ticket() {
    let app = helpers::TestApp::new().await;
    let mgr = app
        .login_as("mgr", "MANAGER", PermissionLevel::Manager)
        .await;

    let unknown_action = app
        .request("POST", "/api/tickets/1/teleport", None, Some(&mgr))
        .await;
    assert_eq!(unknown_action.status, StatusCode::NOT_FOUND);

    let unknown_ticket = app
        .request("POST", "/api/tickets/999/accept", None, Some(&mgr))
        .await;
    assert_eq!(unknown_ticket.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_comments() {
    let app = helpers::TestApp::new().await;
    let op = app
        .login_as("op", "OPERATOR", PermissionLevel::Operator)
        .await;
    let id = report(&app, &op).await;

    let blank = app
        .request(
            "POST",
            &format!("/api/tickets/{id}/comments"),
            Some(json!({ "body": "   " })),
            Some(&op),
        )
        .await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);

    let posted = app
        .request(
            "POST",
            &format!("/api/tickets/{id}/comments"),
            Some(json!({ "body": "Still leaking" })),
            Some(&op),
        )
        .await;
    assert!(posted.status.is_success(), "{}", posted.body);

    let listed = app
        .request("GET", &format!("/api/tickets/{id}/comments"), None, Some(&op))
        .await;
    assert_eq!(listed.body["data"].as_array().unwrap().len(), 1);
}
