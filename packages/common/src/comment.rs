use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::comment_status::CommentStatus;
use crate::platform::Platform;
use crate::social::{Comment, Post, PostType};

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s]+").expect("valid url regex"));
static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(\w+)").expect("valid mention regex"));
static HASHTAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\w+)").expect("valid hashtag regex"));

/// Identity of a comment record. Unique per platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommentKey {
    pub platform: Platform,
    pub comment_id: String,
}

impl CommentKey {
    pub fn new(platform: Platform, comment_id: impl Into<String>) -> Self {
        Self {
            platform,
            comment_id: comment_id.into(),
        }
    }
}

impl fmt::Display for CommentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.platform, self.comment_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagType {
    Spam,
    Scam,
    Impersonation,
    Inappropriate,
    Promotional,
    SuspiciousLink,
    FakeCustomerService,
    Phishing,
    Malware,
    Harassment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisFlag {
    #[serde(rename = "type")]
    pub flag_type: FlagType,
    /// 0-100.
    pub confidence: u8,
    pub reason: String,
}

impl AnalysisFlag {
    pub fn new(flag_type: FlagType, confidence: u8, reason: impl Into<String>) -> Self {
        Self {
            flag_type,
            confidence: confidence.min(100),
            reason: reason.into(),
        }
    }
}

/// Result of running an analysis policy over a comment, plus the entities
/// extracted from its text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub is_authorized: bool,
    #[serde(default)]
    pub is_owner_comment: bool,
    #[serde(default)]
    pub is_whitelisted: bool,
    pub suspicious_score: u8,
    #[serde(default)]
    pub flags: Vec<AnalysisFlag>,
    #[serde(default)]
    pub detected_keywords: Vec<String>,
    #[serde(default)]
    pub detected_urls: Vec<String>,
    #[serde(default)]
    pub detected_mentions: Vec<String>,
    #[serde(default)]
    pub detected_hashtags: Vec<String>,
}

impl Default for Analysis {
    fn default() -> Self {
        Self {
            is_authorized: true,
            is_owner_comment: false,
            is_whitelisted: false,
            suspicious_score: 0,
            flags: Vec::new(),
            detected_keywords: Vec::new(),
            detected_urls: Vec::new(),
            detected_mentions: Vec::new(),
            detected_hashtags: Vec::new(),
        }
    }
}

impl Analysis {
    /// Average confidence of `flags`, capped at 100. Zero without flags.
    pub fn score_from_flags(flags: &[AnalysisFlag]) -> u8 {
        if flags.is_empty() {
            return 0;
        }
        let total: u32 = flags.iter().map(|f| u32::from(f.confidence)).sum();
        let avg = total / flags.len() as u32;
        avg.min(100) as u8
    }

    pub fn add_flag(&mut self, flag: AnalysisFlag) {
        self.flags.push(flag);
        self.suspicious_score = Self::score_from_flags(&self.flags);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    #[default]
    None,
    Delete,
    Hide,
    Flag,
    Notify,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Delete => "delete",
            Self::Hide => "hide",
            Self::Flag => "flag",
            Self::Notify => "notify",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What was done to the comment on the platform, and whether it worked.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionRecord {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub retry_count: u32,
}

impl ActionRecord {
    pub fn succeeded(action_type: ActionType, at: DateTime<Utc>) -> Self {
        Self {
            action_type,
            timestamp: Some(at),
            success: true,
            ..Default::default()
        }
    }

    pub fn failed(action_type: ActionType, error: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            action_type,
            timestamp: Some(at),
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Approve,
    Delete,
    Hide,
    WhitelistAuthor,
    Flag,
}

/// Human review block. Reviewed records are never purged by cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ManualReview {
    #[serde(default)]
    pub is_reviewed: bool,
    #[serde(default)]
    pub reviewed_by: Option<String>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub review_action: Option<ReviewAction>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Durable ledger entry for one comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub tenant_id: String,
    pub platform: Platform,
    pub comment_id: String,
    pub post_id: String,
    pub post_type: PostType,
    pub post_url: Option<String>,
    pub post_caption: Option<String>,
    pub text: String,
    pub author_id: Option<String>,
    pub author_username: Option<String>,
    pub author_display_name: Option<String>,
    pub is_reply: bool,
    pub parent_comment_id: Option<String>,
    pub like_count: u64,
    pub reply_count: u64,
    pub comment_created_at: DateTime<Utc>,
    pub discovered_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub status: CommentStatus,
    pub analysis: Analysis,
    pub action: ActionRecord,
    #[serde(default)]
    pub manual_review: ManualReview,
}

impl CommentRecord {
    /// Builds a `Pending` record for a freshly discovered comment.
    pub fn discovered(
        tenant_id: &str,
        platform: Platform,
        comment: &Comment,
        post: &Post,
        now: DateTime<Utc>,
    ) -> Self {
        let entities = TextEntities::extract(&comment.text);
        Self {
            tenant_id: tenant_id.to_string(),
            platform,
            comment_id: comment.id.clone(),
            post_id: post.id.clone(),
            post_type: post.post_type,
            post_url: post.permalink.clone(),
            post_caption: post.caption.clone(),
            text: comment.text.clone(),
            author_id: comment.author_id.clone(),
            author_username: comment.author_username.clone(),
            author_display_name: comment.author_display_name.clone(),
            is_reply: comment.is_reply(),
            parent_comment_id: comment.parent_id.clone(),
            like_count: comment.like_count,
            reply_count: comment.reply_count,
            comment_created_at: comment.created_at.unwrap_or(now),
            discovered_at: now,
            processed_at: None,
            status: CommentStatus::Pending,
            analysis: Analysis {
                detected_urls: entities.urls,
                detected_mentions: entities.mentions,
                detected_hashtags: entities.hashtags,
                ..Analysis::default()
            },
            action: ActionRecord::default(),
            manual_review: ManualReview::default(),
        }
    }

    pub fn key(&self) -> CommentKey {
        CommentKey::new(self.platform, self.comment_id.clone())
    }

    /// First 100 characters of the text, for notifications and logs.
    pub fn excerpt(&self) -> String {
        self.text.chars().take(100).collect()
    }
}

/// URLs, mentions and hashtags found in a comment body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextEntities {
    pub urls: Vec<String>,
    pub mentions: Vec<String>,
    pub hashtags: Vec<String>,
}

impl TextEntities {
    pub fn extract(text: &str) -> Self {
        Self {
            urls: URL_RE.find_iter(text).map(|m| m.as_str().to_string()).collect(),
            mentions: MENTION_RE
                .captures_iter(text)
                .map(|c| c[1].to_string())
                .collect(),
            hashtags: HASHTAG_RE
                .captures_iter(text)
                .map(|c| c[1].to_string())
                .collect(),
        }
    }
}
