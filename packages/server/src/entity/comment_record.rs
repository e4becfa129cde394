use common::{CommentStatus, Platform};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row per comment ever seen, keyed by (platform, comment id).
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comment_record")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub platform: Platform,
    #[sea_orm(primary_key, auto_increment = false)]
    pub comment_id: String,

    #[sea_orm(indexed)]
    pub tenant_id: String,

    pub post_id: String,
    /// One of: photo, video, carousel, story, reel, post.
    pub post_type: String,
    pub post_url: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub post_caption: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub text: String,
    pub author_id: Option<String>,
    pub author_username: Option<String>,
    pub author_display_name: Option<String>,

    pub is_reply: bool,
    pub parent_comment_id: Option<String>,
    pub like_count: i64,
    pub reply_count: i64,

    pub comment_created_at: DateTimeUtc,
    #[sea_orm(indexed)]
    pub discovered_at: DateTimeUtc,
    pub processed_at: Option<DateTimeUtc>,

    #[sea_orm(indexed)]
    pub status: CommentStatus,
    #[sea_orm(indexed)]
    pub suspicious_score: i16,
    /// Mirrors `manual_review.is_reviewed` so cleanup can filter on it.
    #[sea_orm(default_value = false)]
    pub is_reviewed: bool,

    #[sea_orm(column_type = "JsonBinary")]
    pub analysis: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub action: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub manual_review: Json,
}

impl ActiveModelBehavior for ActiveModel {}
