use async_trait::async_trait;
use common::platform::Platform;
use common::social::{Comment, Post};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Outcome of checking a token against `/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenValidation {
    pub valid: bool,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongLivedToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Seconds until expiry, when the platform reports it.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl std::fmt::Debug for LongLivedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LongLivedToken")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

/// Remote platform operations used by the pipeline.
///
/// Every call goes through the implementation's throttle and retry policy.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// Most recent posts of the tenant's account.
    async fn list_recent_posts(
        &self,
        platform: Platform,
        account_id: &str,
        access_token: &str,
        limit: u32,
    ) -> Result<Vec<Post>, ApiError>;

    /// Comments on a post. Instagram comments carry their replies nested.
    async fn list_comments(
        &self,
        platform: Platform,
        post_id: &str,
        access_token: &str,
        limit: u32,
    ) -> Result<Vec<Comment>, ApiError>;

    async fn delete_comment(
        &self,
        platform: Platform,
        comment_id: &str,
        access_token: &str,
    ) -> Result<(), ApiError>;

    async fn hide_comment(
        &self,
        platform: Platform,
        comment_id: &str,
        access_token: &str,
        hidden: bool,
    ) -> Result<(), ApiError>;

    async fn exchange_token(&self, short_lived_token: &str) -> Result<LongLivedToken, ApiError>;

    /// Never fails; a rejected token yields `valid = false` with the error text.
    async fn validate_token(&self, access_token: &str) -> TokenValidation;
}
