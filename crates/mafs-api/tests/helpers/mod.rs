//! Shared test helpers for API tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use mafs_api::{AppState, build_app};
use mafs_auth::PasswordHasher;
use mafs_core::config::AppConfig;
use mafs_database::{MemoryStore, Stores};
use mafs_entity::user::{CreateUser, PermissionLevel, User};
use mafs_messaging::{MessagePusher, RecordingPusher, StaticProfiles};
use mafs_service::notification::build_tasks;
use mafs_worker::NotificationScheduler;

/// Webhook channel secret used by the test config.
pub const CHANNEL_SECRET: &str = "test-channel-secret";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Stores behind the router
    pub stores: Stores,
    /// Upload root, removed on drop
    pub uploads: TempDir,
}

impl TestApp {
    /// Create a new test application over fresh in-memory stores
    pub async fn new() -> Self {
        let uploads = TempDir::new().expect("Failed to create upload dir");

        let mut config = AppConfig::default();
        config.auth.jwt_secret = "test-secret".into();
        config.server.expose_errors = Some(true);
        config.line.channel_secret = CHANNEL_SECRET.into();
        config.uploads.root = uploads.path().to_string_lossy().into_owned();

        let stores = Stores::memory(Arc::new(MemoryStore::with_reference_data()));
        let pusher: Arc<dyn MessagePusher> = Arc::new(RecordingPusher::new());
        let tasks = build_tasks(&stores, pusher, &config.notifications);
        let scheduler = Arc::new(
            NotificationScheduler::new(Arc::clone(&stores.schedules), tasks)
                .await
                .expect("Failed to create scheduler"),
        );
        let profiles = Arc::new(StaticProfiles::new().with("liff-token", "U-line-op", "Op"));

        let state = AppState::new(config, stores.clone(), profiles, scheduler);
        Self {
            router: build_app(state),
            stores,
            uploads,
        }
    }

    /// Create an active user with a password
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        group: &str,
        level: PermissionLevel,
    ) -> User {
        let hash = PasswordHasher::new()
            .hash_password(password)
            .expect("Failed to hash password");
        self.stores
            .users
            .create(CreateUser {
                person_no: format!("P-{username}"),
                username: username.to_string(),
                display_name: username.to_uppercase(),
                email: None,
                department: None,
                group_code: group.to_string(),
                permission_level: level,
                password_hash: hash,
            })
            .await
            .expect("Failed to create user")
    }

    /// Create a user and log in, returning the bearer token
    pub async fn login_as(&self, username: &str, group: &str, level: PermissionLevel) -> String {
        self.create_user(username, "password123", group, level).await;
        let response = self
            .request(
                "POST",
                "/api/auth/login",
                Some(serde_json::json!({ "username": username, "password": "password123" })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.body);
        response.body["token"]
            .as_str()
            .expect("token in login response")
            .to_string()
    }

    /// Make a JSON request against the router
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");
        self.send(req).await
    }

    /// Send a prepared request
    pub async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}
