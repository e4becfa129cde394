//! Platform-neutral shapes for posts and comments. Each API adapter converts
//! its raw payloads into these before anything else sees them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostType {
    Photo,
    Video,
    Carousel,
    Story,
    Reel,
    #[default]
    Post,
}

impl PostType {
    /// Maps an Instagram `media_type` (e.g. `CAROUSEL_ALBUM`) to a post type.
    pub fn from_media_type(media_type: &str) -> Self {
        match media_type.to_ascii_lowercase().as_str() {
            "image" | "photo" => Self::Photo,
            "video" => Self::Video,
            "carousel_album" | "carousel" => Self::Carousel,
            "story" => Self::Story,
            "reels" | "reel" => Self::Reel,
            _ => Self::Post,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Video => "video",
            Self::Carousel => "carousel",
            Self::Story => "story",
            Self::Reel => "reel",
            Self::Post => "post",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub post_type: PostType,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            post_type: PostType::Post,
            permalink: None,
            caption: None,
            created_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub author_username: Option<String>,
    #[serde(default)]
    pub author_display_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub reply_count: u64,
    /// Set when this comment is a reply to another comment.
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Nested replies, populated only by platforms that return them inline.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<Comment>,
}

impl Comment {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            author_id: None,
            author_username: None,
            author_display_name: None,
            created_at: None,
            like_count: 0,
            reply_count: 0,
            parent_id: None,
            replies: Vec::new(),
        }
    }

    pub fn with_author(mut self, author_id: impl Into<String>) -> Self {
        self.author_id = Some(author_id.into());
        self
    }

    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }

    pub fn is_authored_by(&self, account_id: &str) -> bool {
        self.author_id.as_deref() == Some(account_id)
    }

    /// Returns this comment followed by all nested replies, each reply linked
    /// to its parent.
    pub fn flatten(mut self) -> Vec<Comment> {
        let replies = std::mem::take(&mut self.replies);
        let parent_id = self.id.clone();
        let mut out = vec![self];
        for mut reply in replies {
            if reply.parent_id.is_none() {
                reply.parent_id = Some(parent_id.clone());
            }
            out.extend(reply.flatten());
        }
        out
    }
}
