//! # mafs-messaging
//!
//! Outbound and inbound chat messaging. Notifications are delivered through
//! the [`MessagePusher`] seam; the LINE Messaging API client is the
//! production implementation and [`LoggingPusher`] stands in when
//! messaging is disabled.

pub mod line;
pub mod profile;
pub mod pusher;

use std::sync::Arc;

use mafs_core::config::LineConfig;

pub use line::{LineClient, LineProfile, WebhookEvent, WebhookPayload, verify_signature};
pub use profile::{ProfileResolver, StaticProfiles};
pub use pusher::{LoggingPusher, MessagePusher, RecordingPusher};

/// Picks the pusher matching the configuration.
///
/// The LINE client is used only when messaging is enabled and a channel
/// access token is present.
pub fn pusher_from_config(config: &LineConfig) -> Arc<dyn MessagePusher> {
    if config.enabled && !config.channel_access_token.is_empty() {
        match LineClient::new(config) {
            Ok(client) => return Arc::new(client),
            Err(e) => tracing::error!(error = %e, "Failed to build LINE client, falling back to log output"),
        }
    } else {
        tracing::info!("LINE messaging disabled, notifications are written to the log");
    }
    Arc::new(LoggingPusher)
}
