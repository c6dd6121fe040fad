//! Authentication and authorization through the HTTP layer.

mod helpers;

use axum::http::StatusCode;

use mafs_entity::user::PermissionLevel;

#[tokio::test]
async fn test_missing_token_is_rejected() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/api/tickets", None, None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["requireLogin"], true);
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request("GET", "/api/auth/me", None, Some("not-a-jwt"))
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["success"], false);
}

#[tokio::test]
async fn test_login_then_list_tickets() {
    let app = helpers::TestApp::new().await;
    app.create_user("somchai", "password123", "OPERATOR", PermissionLevel::Operator)
        .await;

    let login = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({ "username": "somchai", "password": "password123" })),
            None,
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["success"], true);
    assert_eq!(login.body["user"]["username"], "somchai");
    assert!(login.body["user"].get("passwordHash").is_none());
    let token = login.body["token"].as_str().unwrap().to_string();

    let response = app.request("GET", "/api/tickets", None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert!(response.body["data"]["items"].is_array());
}

#[tokio::test]
async fn test_login_by_person_number() {
    let app = helpers::TestApp::new().await;
    app.create_user("niran", "password123", "ENGINEER", PermissionLevel::Engineer)
        .await;

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({ "username": "P-niran", "password": "password123" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_wrong_password_and_blank_fields() {
    let app = helpers::TestApp::new().await;
    app.create_user("mali", "password123", "OPERATOR", PermissionLevel::Operator)
        .await;

    let wrong = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({ "username": "mali", "password": "nope" })),
            None,
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let blank = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({ "username": "", "password": "" })),
            None,
        )
        .await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_line_login_requires_linked_account() {
    let app = helpers::TestApp::new().await;
    let body = serde_json::json!({ "access_token": "liff-token" });

    let unlinked = app
        .request("POST", "/api/auth/line-login", Some(body.clone()), None)
        .await;
    assert_eq!(unlinked.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unlinked.body["code"], "LINE_NOT_LINKED");

    let token = app
        .login_as("op", "OPERATOR", PermissionLevel::Operator)
        .await;
    let linked = app
        .request(
            "PUT",
            "/api/users/me/line",
            Some(serde_json::json!({ "lineId": "U-line-op" })),
            Some(&token),
        )
        .await;
    assert_eq!(linked.status, StatusCode::OK);

    let login = app
        .request("POST", "/api/auth/line-login", Some(body), None)
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["user"]["username"], "op");
}

#[tokio::test]
async fn test_operator_lacks_dashboard_form() {
    let app = helpers::TestApp::new().await;
    let token = app
        .login_as("op", "OPERATOR", PermissionLevel::Operator)
        .await;

    let response = app
        .request("GET", "/api/dashboard/summary", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["success"], false);

    let me = app.request("GET", "/api/auth/me", None, Some(&token)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert!(me.body["data"]["permissions"].is_array());
}

#[tokio::test]
async fn test_inactive_user_token_is_rejected() {
    let app = helpers::TestApp::new().await;
    let token = app
        .login_as("leaver", "OPERATOR", PermissionLevel::Operator)
        .await;
    let user = app
        .stores
        .users
        .find_by_login("leaver")
        .await
        .unwrap()
        .unwrap();
    app.stores
        .users
        .update(
            user.id,
            mafs_entity::user::UpdateUser {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let response = app.request("GET", "/api/auth/me", None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
