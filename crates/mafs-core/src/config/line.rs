//! LINE messaging configuration.

use serde::{Deserialize, Serialize};

/// Credentials and endpoints for the LINE Messaging API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineConfig {
    /// When false, outbound messages are only logged.
    #[serde(default)]
    pub enabled: bool,
    /// API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Channel access token used for push messages.
    #[serde(default)]
    pub channel_access_token: String,
    /// Channel secret used to verify webhook signatures.
    #[serde(default)]
    pub channel_secret: String,
    /// LIFF application id handed to the SPA.
    #[serde(default)]
    pub liff_id: String,
    /// Outbound request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_base: default_api_base(),
            channel_access_token: String::new(),
            channel_secret: String::new(),
            liff_id: String::new(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.line.me".to_string()
}

fn default_timeout() -> u64 {
    10
}
