use async_trait::async_trait;
use common::platform::Platform;
use common::social::{Comment, Post};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use crate::config::ApiClientConfig;
use crate::error::{ApiError, Result};
use crate::platform::{LongLivedToken, PlatformApi, TokenValidation};
use crate::rate_limit::RateLimiter;
use crate::types::{
    FacebookComment, FacebookPost, InstagramComment, InstagramMedia, MeResponse, Paged,
    SuccessResponse, TokenExchangeResponse,
};

const INSTAGRAM_MEDIA_FIELDS: &str =
    "id,media_type,media_url,permalink,caption,timestamp,comments_count,like_count";
const INSTAGRAM_COMMENT_FIELDS: &str = "id,text,timestamp,username,user{id,username,profile_picture_url},like_count,replies{id,text,timestamp,username,user{id,username}}";
const FACEBOOK_POST_FIELDS: &str =
    "id,message,created_time,permalink_url,comments_count,reactions.summary(true),attachments";
const FACEBOOK_COMMENT_FIELDS: &str =
    "id,message,created_time,from{id,name,picture},like_count,comment_count,parent{id}";

/// Graph API client for Instagram business accounts and Facebook pages.
///
/// One instance shares one throttle across all callers.
pub struct MetaClient {
    http: reqwest::Client,
    config: ApiClientConfig,
    graph_url: String,
    limiter: RateLimiter,
}

impl MetaClient {
    pub fn new(config: ApiClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http,
            graph_url: config.graph_url(),
            limiter: RateLimiter::from_config(&config),
            config,
        })
    }

    async fn request<T: DeserializeOwned>(
        &self,
        operation: &str,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&serde_json::Value>,
    ) -> Result<T> {
        let url = format!("{}{}", self.graph_url, path);
        debug!(operation, method = %method, path, "Graph API request");

        self.limiter
            .execute(operation, || {
                let mut request = self.http.request(method.clone(), &url).query(query);
                if let Some(body) = body {
                    request = request.json(body);
                }
                async move {
                    let response = request.send().await?;
                    decode_response(response).await
                }
            })
            .await
    }

    pub async fn instagram_media(
        &self,
        account_id: &str,
        access_token: &str,
        limit: u32,
    ) -> Result<Vec<InstagramMedia>> {
        let limit = limit.to_string();
        let page: Paged<InstagramMedia> = self
            .request(
                "instagram_media",
                Method::GET,
                &format!("/{account_id}/media"),
                &[
                    ("access_token", access_token),
                    ("fields", INSTAGRAM_MEDIA_FIELDS),
                    ("limit", &limit),
                ],
                None,
            )
            .await?;
        Ok(page.data)
    }

    pub async fn instagram_comments(
        &self,
        media_id: &str,
        access_token: &str,
        limit: u32,
    ) -> Result<Vec<InstagramComment>> {
        let limit = limit.to_string();
        let page: Paged<InstagramComment> = self
            .request(
                "instagram_comments",
                Method::GET,
                &format!("/{media_id}/comments"),
                &[
                    ("access_token", access_token),
                    ("fields", INSTAGRAM_COMMENT_FIELDS),
                    ("limit", &limit),
                ],
                None,
            )
            .await?;
        Ok(page.data)
    }

    pub async fn facebook_posts(
        &self,
        page_id: &str,
        access_token: &str,
        limit: u32,
    ) -> Result<Vec<FacebookPost>> {
        let limit = limit.to_string();
        let page: Paged<FacebookPost> = self
            .request(
                "facebook_posts",
                Method::GET,
                &format!("/{page_id}/posts"),
                &[
                    ("access_token", access_token),
                    ("fields", FACEBOOK_POST_FIELDS),
                    ("limit", &limit),
                ],
                None,
            )
            .await?;
        Ok(page.data)
    }

    pub async fn facebook_comments(
        &self,
        post_id: &str,
        access_token: &str,
        limit: u32,
    ) -> Result<Vec<FacebookComment>> {
        let limit = limit.to_string();
        let page: Paged<FacebookComment> = self
            .request(
                "facebook_comments",
                Method::GET,
                &format!("/{post_id}/comments"),
                &[
                    ("access_token", access_token),
                    ("fields", FACEBOOK_COMMENT_FIELDS),
                    ("limit", &limit),
                    ("order", "reverse_chronological"),
                ],
                None,
            )
            .await?;
        Ok(page.data)
    }

    /// Deletes any Graph object by id. Comments on both platforms use this.
    pub async fn delete_object(&self, object_id: &str, access_token: &str) -> Result<()> {
        let response: SuccessResponse = self
            .request(
                "delete_object",
                Method::DELETE,
                &format!("/{object_id}"),
                &[("access_token", access_token)],
                None,
            )
            .await?;
        ensure_success(response, "delete")
    }

    pub async fn set_comment_hidden(
        &self,
        platform: Platform,
        comment_id: &str,
        access_token: &str,
        hidden: bool,
    ) -> Result<()> {
        let body = match platform {
            Platform::Instagram => json!({ "hide": hidden }),
            Platform::Facebook => json!({ "is_hidden": hidden }),
        };
        let response: SuccessResponse = self
            .request(
                "hide_comment",
                Method::POST,
                &format!("/{comment_id}"),
                &[("access_token", access_token)],
                Some(&body),
            )
            .await?;
        ensure_success(response, "hide")
    }

    pub async fn long_lived_token(&self, short_lived_token: &str) -> Result<TokenExchangeResponse> {
        let app_id = self
            .config
            .app_id
            .as_deref()
            .ok_or(ApiError::MissingConfig("meta.app_id"))?;
        let app_secret = self
            .config
            .app_secret
            .as_deref()
            .ok_or(ApiError::MissingConfig("meta.app_secret"))?;

        self.request(
            "exchange_token",
            Method::GET,
            "/oauth/access_token",
            &[
                ("grant_type", "fb_exchange_token"),
                ("client_id", app_id),
                ("client_secret", app_secret),
                ("fb_exchange_token", short_lived_token),
            ],
            None,
        )
        .await
    }

    pub async fn me(&self, access_token: &str) -> Result<MeResponse> {
        self.request(
            "me",
            Method::GET,
            "/me",
            &[("access_token", access_token), ("fields", "id,name")],
            None,
        )
        .await
    }
}

async fn decode_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::from_response(status.as_u16(), &body));
    }
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn ensure_success(response: SuccessResponse, action: &str) -> Result<()> {
    if response.success {
        Ok(())
    } else {
        Err(ApiError::Api {
            status: 200,
            code: None,
            message: format!("{action} was not acknowledged"),
        })
    }
}

#[async_trait]
impl PlatformApi for MetaClient {
    async fn list_recent_posts(
        &self,
        platform: Platform,
        account_id: &str,
        access_token: &str,
        limit: u32,
    ) -> Result<Vec<Post>> {
        let posts = match platform {
            Platform::Instagram => self
                .instagram_media(account_id, access_token, limit)
                .await?
                .into_iter()
                .map(Post::from)
                .collect(),
            Platform::Facebook => self
                .facebook_posts(account_id, access_token, limit)
                .await?
                .into_iter()
                .map(Post::from)
                .collect(),
        };
        Ok(posts)
    }

    async fn list_comments(
        &self,
        platform: Platform,
        post_id: &str,
        access_token: &str,
        limit: u32,
    ) -> Result<Vec<Comment>> {
        let comments = match platform {
            Platform::Instagram => self
                .instagram_comments(post_id, access_token, limit)
                .await?
                .into_iter()
                .map(Comment::from)
                .collect(),
            Platform::Facebook => self
                .facebook_comments(post_id, access_token, limit)
                .await?
                .into_iter()
                .map(Comment::from)
                .collect(),
        };
        Ok(comments)
    }

    async fn delete_comment(
        &self,
        _platform: Platform,
        comment_id: &str,
        access_token: &str,
    ) -> Result<()> {
        self.delete_object(comment_id, access_token).await
    }

    async fn hide_comment(
        &self,
        platform: Platform,
        comment_id: &str,
        access_token: &str,
        hidden: bool,
    ) -> Result<()> {
        self.set_comment_hidden(platform, comment_id, access_token, hidden)
            .await
    }

    async fn exchange_token(&self, short_lived_token: &str) -> Result<LongLivedToken> {
        let response = self.long_lived_token(short_lived_token).await?;
        Ok(LongLivedToken {
            access_token: response.access_token,
            token_type: response.token_type,
            expires_in: response.expires_in,
        })
    }

    async fn validate_token(&self, access_token: &str) -> TokenValidation {
        match self.me(access_token).await {
            Ok(me) => TokenValidation {
                valid: true,
                account_id: Some(me.id),
                name: me.name,
                error: None,
            },
            Err(e) => TokenValidation {
                valid: false,
                account_id: None,
                name: None,
                error: Some(e.to_string()),
            },
        }
    }
}
