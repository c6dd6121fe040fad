//! Inbound webhook payload types.

use serde::{Deserialize, Serialize};

/// Body of a webhook delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    /// Bot user ID that received the events.
    #[serde(default)]
    pub destination: String,
    /// Delivered events; empty for the console's verification request.
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

/// One webhook event. Only the fields the backend reacts to are typed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    /// Event type (`message`, `follow`, `unfollow`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Milliseconds since epoch.
    #[serde(default)]
    pub timestamp: i64,
    /// Origin of the event.
    #[serde(default)]
    pub source: Option<EventSource>,
    /// Token for a reply, when the event allows one.
    #[serde(default)]
    pub reply_token: Option<String>,
    /// Message object for `message` events.
    #[serde(default)]
    pub message: Option<serde_json::Value>,
}

/// Source of a webhook event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSource {
    /// `user`, `group` or `room`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Sending user, when known.
    #[serde(default)]
    pub user_id: Option<String>,
}

impl WebhookEvent {
    /// User ID of the sender, if the event came from a user.
    pub fn user_id(&self) -> Option<&str> {
        self.source.as_ref().and_then(|s| s.user_id.as_deref())
    }
}
