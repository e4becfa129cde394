//! Raw Graph API payloads and their conversion into the normalized
//! [`Post`] and [`Comment`] shapes.

use chrono::{DateTime, Utc};
use common::social::{Comment, Post, PostType};
use serde::Deserialize;

/// Paged list envelope (`{"data": [...], "paging": {...}}`).
#[derive(Debug, Clone, Deserialize)]
pub struct Paged<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// Graph timestamps look like `2024-03-01T12:00:00+0000`.
pub fn parse_graph_time(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstagramMedia {
    pub id: String,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub comments_count: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstagramUser {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstagramComment {
    pub id: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub user: Option<InstagramUser>,
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub replies: Option<Paged<InstagramComment>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FacebookPost {
    pub id: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub permalink_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FacebookAuthor {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FacebookParent {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FacebookComment {
    pub id: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub from: Option<FacebookAuthor>,
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default)]
    pub comment_count: Option<u64>,
    #[serde(default)]
    pub parent: Option<FacebookParent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenExchangeResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeResponse {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuccessResponse {
    #[serde(default)]
    pub success: bool,
}

impl From<InstagramMedia> for Post {
    fn from(media: InstagramMedia) -> Self {
        Post {
            post_type: media
                .media_type
                .as_deref()
                .map(PostType::from_media_type)
                .unwrap_or_default(),
            created_at: media.timestamp.as_deref().and_then(parse_graph_time),
            id: media.id,
            permalink: media.permalink,
            caption: media.caption,
        }
    }
}

impl From<InstagramComment> for Comment {
    fn from(raw: InstagramComment) -> Self {
        let replies: Vec<Comment> = raw
            .replies
            .map(|page| page.data)
            .unwrap_or_default()
            .into_iter()
            .map(|reply| {
                let mut reply = Comment::from(reply);
                if reply.parent_id.is_none() {
                    reply.parent_id = Some(raw.id.clone());
                }
                reply
            })
            .collect();
        let (author_id, user_name) = match raw.user {
            Some(user) => (Some(user.id), user.username),
            None => (None, None),
        };

        Comment {
            text: raw.text.unwrap_or_default(),
            author_id,
            author_username: user_name.or_else(|| raw.username.clone()),
            author_display_name: raw.username,
            created_at: raw.timestamp.as_deref().and_then(parse_graph_time),
            like_count: raw.like_count.unwrap_or(0),
            reply_count: replies.len() as u64,
            parent_id: raw.parent_id,
            replies,
            id: raw.id,
        }
    }
}

impl From<FacebookPost> for Post {
    fn from(post: FacebookPost) -> Self {
        Post {
            id: post.id,
            post_type: PostType::Post,
            permalink: post.permalink_url,
            caption: post.message,
            created_at: post.created_time.as_deref().and_then(parse_graph_time),
        }
    }
}

impl From<FacebookComment> for Comment {
    fn from(raw: FacebookComment) -> Self {
        let (author_id, author_name) = match raw.from {
            Some(from) => (Some(from.id), from.name),
            None => (None, None),
        };

        Comment {
            id: raw.id,
            text: raw.message.unwrap_or_default(),
            author_id,
            author_username: None,
            author_display_name: author_name,
            created_at: raw.created_time.as_deref().and_then(parse_graph_time),
            like_count: raw.like_count.unwrap_or(0),
            reply_count: raw.comment_count.unwrap_or(0),
            parent_id: raw.parent.map(|p| p.id),
            replies: Vec::new(),
        }
    }
}
