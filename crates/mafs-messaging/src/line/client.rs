//! HTTP client for the LINE push and profile endpoints.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use mafs_core::config::LineConfig;
use mafs_core::error::{AppError, ErrorKind};
use mafs_core::result::AppResult;

use crate::pusher::MessagePusher;

/// Longest text a single LINE text message may carry.
pub const MAX_TEXT_CHARS: usize = 5000;

#[derive(Debug, Serialize)]
struct PushRequest<'a> {
    to: &'a str,
    messages: Vec<TextMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

/// Profile returned for a LIFF or login access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineProfile {
    /// LINE user ID (`U...`).
    pub user_id: String,
    /// Display name.
    pub display_name: String,
    /// Avatar URL.
    #[serde(default)]
    pub picture_url: Option<String>,
    /// Status message.
    #[serde(default)]
    pub status_message: Option<String>,
}

/// LINE Messaging API client.
#[derive(Clone)]
pub struct LineClient {
    http: reqwest::Client,
    api_base: String,
    channel_access_token: String,
}

impl std::fmt::Debug for LineClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineClient")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl LineClient {
    /// Builds a client from configuration.
    pub fn new(config: &LineConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::ExternalService, "Failed to build HTTP client", e)
            })?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            channel_access_token: config.channel_access_token.clone(),
        })
    }

    /// Resolves the profile behind a user access token (LIFF login).
    ///
    /// A token LINE rejects yields an authentication error.
    pub async fn get_profile(&self, access_token: &str) -> AppResult<LineProfile> {
        let response = self
            .http
            .get(format!("{}/v2/profile", self.api_base))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::ExternalService, "LINE profile request failed", e)
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::BAD_REQUEST {
            return Err(AppError::authentication("LINE access token is invalid or expired"));
        }
        if !status.is_success() {
            return Err(AppError::external(format!(
                "LINE profile request returned {status}"
            )));
        }

        response.json::<LineProfile>().await.map_err(|e| {
            AppError::with_source(ErrorKind::ExternalService, "Malformed LINE profile response", e)
        })
    }
}

/// Cuts `text` to the LINE text limit on a character boundary.
pub fn truncate_text(text: &str) -> &str {
    match text.char_indices().nth(MAX_TEXT_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[async_trait]
impl MessagePusher for LineClient {
    fn name(&self) -> &'static str {
        "line"
    }

    async fn push_text(&self, to: &str, text: &str) -> AppResult<()> {
        let body = PushRequest {
            to,
            messages: vec![TextMessage {
                kind: "text",
                text: truncate_text(text),
            }],
        };

        let response = self
            .http
            .post(format!("{}/v2/bot/message/push", self.api_base))
            .bearer_auth(&self.channel_access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::ExternalService, "LINE push request failed", e)
            })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(to, "LINE push delivered");
            return Ok(());
        }

        let detail = response
            .json::<ApiError>()
            .await
            .map(|e| e.message)
            .unwrap_or_default();
        tracing::warn!(to, %status, detail = %detail, "LINE push rejected");
        Err(AppError::external(format!("LINE push returned {status}: {detail}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_body_shape() {
        let body = PushRequest {
            to: "U123",
            messages: vec![TextMessage {
                kind: "text",
                text: "hi",
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"to": "U123", "messages": [{"type": "text", "text": "hi"}]})
        );
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let long = "ก".repeat(MAX_TEXT_CHARS + 10);
        assert_eq!(truncate_text(&long).chars().count(), MAX_TEXT_CHARS);
        assert_eq!(truncate_text("short"), "short");
    }

    #[test]
    fn test_profile_deserializes() {
        let profile: LineProfile =
            serde_json::from_str(r#"{"userId":"U1","displayName":"Somchai"}"#).unwrap();
        assert_eq!(profile.user_id, "U1");
        assert!(profile.picture_url.is_none());
    }
}
