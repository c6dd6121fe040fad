//! Resolving LINE access tokens to profiles.

use std::collections::HashMap;

use async_trait::async_trait;

use mafs_core::error::AppError;
use mafs_core::result::AppResult;

use crate::line::{LineClient, LineProfile};

/// Turns a LIFF access token into the profile it belongs to.
#[async_trait]
pub trait ProfileResolver: Send + Sync + 'static {
    /// Resolves `access_token`; an unknown token is an authentication error.
    async fn resolve(&self, access_token: &str) -> AppResult<LineProfile>;
}

#[async_trait]
impl ProfileResolver for LineClient {
    async fn resolve(&self, access_token: &str) -> AppResult<LineProfile> {
        self.get_profile(access_token).await
    }
}

/// Fixed token-to-profile table.
#[derive(Debug, Clone, Default)]
pub struct StaticProfiles {
    profiles: HashMap<String, LineProfile>,
}

impl StaticProfiles {
    /// Creates an empty table; every token is rejected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a token mapping.
    pub fn with(mut self, access_token: &str, user_id: &str, display_name: &str) -> Self {
        self.profiles.insert(
            access_token.to_string(),
            LineProfile {
                user_id: user_id.to_string(),
                display_name: display_name.to_string(),
                picture_url: None,
                status_message: None,
            },
        );
        self
    }
}

#[async_trait]
impl ProfileResolver for StaticProfiles {
    async fn resolve(&self, access_token: &str) -> AppResult<LineProfile> {
        self.profiles
            .get(access_token)
            .cloned()
            .ok_or_else(|| AppError::authentication("LINE access token is invalid or expired"))
    }
}
