//! Admin endpoints and the LINE webhook.

mod helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;

use mafs_entity::user::PermissionLevel;
use mafs_messaging::line::sign;

#[tokio::test]
async fn test_schedules_require_admin_group() {
    let app = helpers::TestApp::new().await;
    let mgr = app
        .login_as("mgr", "MANAGER", PermissionLevel::Manager)
        .await;

    let response = app
        .request("GET", "/api/admin/notification-schedules", None, Some(&mgr))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_list_schedules() {
    let app = helpers::TestApp::new().await;
    let admin = app
        .login_as("root", "ADMIN", PermissionLevel::Manager)
        .await;

    let response = app
        .request("GET", "/api/admin/notification-schedules", None, Some(&admin))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let rows = response.body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().any(|r| r["notificationType"] == "old_open_tickets"));
}

#[tokio::test]
async fn test_invalid_cron_is_rejected() {
    let app = helpers::TestApp::new().await;
    let admin = app
        .login_as("root", "ADMIN", PermissionLevel::Manager)
        .await;

    let response = app
        .request(
            "PUT",
            "/api/admin/notification-schedules/pending_tickets",
            Some(json!({ "scheduleCron": "61 25 * * *", "isEnabled": true })),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "INVALID_CRON");

    let unknown = app
        .request(
            "PUT",
            "/api/admin/notification-schedules/weekly_digest",
            Some(json!({ "scheduleCron": "0 9 * * *", "isEnabled": true })),
            Some(&admin),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_manual_run_reports_summary() {
    let app = helpers::TestApp::new().await;
    let admin = app
        .login_as("root", "ADMIN", PermissionLevel::Manager)
        .await;

    let response = app
        .request(
            "POST",
            "/api/admin/notification-schedules/old_open_tickets/run",
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    assert_eq!(response.body["data"]["notificationType"], "old_open_tickets");
    assert_eq!(response.body["data"]["outcome"], "completed");
    assert_eq!(response.body["data"]["summary"]["candidates"], 0);
}

#[tokio::test]
async fn test_admin_group_cannot_be_edited() {
    let app = helpers::TestApp::new().await;
    let admin = app
        .login_as("root", "ADMIN", PermissionLevel::Manager)
        .await;

    let response = app
        .request(
            "PUT",
            "/api/admin/form-permissions",
            Some(json!([{
                "groupCode": "ADMIN",
                "formCode": "tickets",
                "canView": false,
                "canCreate": false,
                "canUpdate": false,
                "canDelete": false
            }])),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

fn webhook_request(body: &str, signature: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/line/webhook")
        .header("Content-Type", "application/json")
        .header("x-line-signature", signature)
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_webhook_signature() {
    let app = helpers::TestApp::new().await;
    let body = r#"{"destination":"Ubot","events":[{"type":"follow","source":{"type":"user","userId":"U123"}}]}"#;

    let rejected = app.send(webhook_request(body, "bm90LXRoZS1zaWduYXR1cmU=")).await;
    assert_eq!(rejected.status, StatusCode::UNAUTHORIZED);
    assert_eq!(rejected.body["code"], "INVALID_SIGNATURE");

    let signature = sign(helpers::CHANNEL_SECRET, body.as_bytes());
    let accepted = app.send(webhook_request(body, &signature)).await;
    assert_eq!(accepted.status, StatusCode::OK, "{}", accepted.body);
}

#[tokio::test]
async fn test_health_is_public() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/api/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
}
