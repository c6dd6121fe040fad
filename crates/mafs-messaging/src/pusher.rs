//! Message delivery seam.

use async_trait::async_trait;
use tokio::sync::Mutex;

use mafs_core::error::AppError;
use mafs_core::result::AppResult;

/// Delivers plain-text messages to a chat user.
#[async_trait]
pub trait MessagePusher: Send + Sync + 'static {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Sends `text` to the chat user identified by `to`.
    async fn push_text(&self, to: &str, text: &str) -> AppResult<()>;
}

/// Writes messages to the log instead of sending them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingPusher;

#[async_trait]
impl MessagePusher for LoggingPusher {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn push_text(&self, to: &str, text: &str) -> AppResult<()> {
        tracing::info!(to, chars = text.chars().count(), "Message (not sent)\n{text}");
        Ok(())
    }
}

/// Keeps every message in memory; recipients listed in `failing` error out.
#[derive(Debug, Default)]
pub struct RecordingPusher {
    sent: Mutex<Vec<(String, String)>>,
    failing: Vec<String>,
}

impl RecordingPusher {
    /// Creates a pusher that accepts every recipient.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pusher that rejects the given recipients.
    pub fn failing_for(recipients: &[&str]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: recipients.iter().map(|r| r.to_string()).collect(),
        }
    }

    /// Returns `(recipient, text)` pairs in send order.
    pub async fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl MessagePusher for RecordingPusher {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn push_text(&self, to: &str, text: &str) -> AppResult<()> {
        if self.failing.iter().any(|f| f == to) {
            return Err(AppError::external(format!("Recipient {to} rejected")));
        }
        self.sent.lock().await.push((to.to_string(), text.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_pusher() {
        let pusher = RecordingPusher::failing_for(&["Ubad"]);
        pusher.push_text("Ugood", "hello").await.unwrap();
        assert!(pusher.push_text("Ubad", "hello").await.is_err());
        assert_eq!(pusher.sent().await, vec![("Ugood".into(), "hello".into())]);
    }
}
