use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::comment::ActionType;
use crate::mq::JobMessage;
use crate::platform::Platform;
use crate::social::{Comment, Post};
use crate::tenant::{TenantCredentials, TenantSettings};

/// Named queues the pipeline runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueName {
    MonitorTenant,
    ProcessComment,
    BatchDelete,
}

impl QueueName {
    pub const ALL: [QueueName; 3] = [
        QueueName::MonitorTenant,
        QueueName::ProcessComment,
        QueueName::BatchDelete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MonitorTenant => "monitor-tenant",
            Self::ProcessComment => "process-comment",
            Self::BatchDelete => "batch-delete",
        }
    }
}

/// Every job the pipeline enqueues. Handlers match on the variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum JobPayload {
    MonitorTenant(MonitorTenantJob),
    ProcessComment(ProcessCommentJob),
    BatchDelete(BatchDeleteJob),
}

impl JobMessage for JobPayload {
    fn queue_name(&self) -> &'static str {
        match self {
            Self::MonitorTenant(_) => QueueName::MonitorTenant.as_str(),
            Self::ProcessComment(_) => QueueName::ProcessComment.as_str(),
            Self::BatchDelete(_) => QueueName::BatchDelete.as_str(),
        }
    }

    fn tenant_id(&self) -> Option<&str> {
        match self {
            Self::MonitorTenant(job) => Some(&job.tenant_id),
            Self::ProcessComment(job) => Some(&job.tenant_id),
            Self::BatchDelete(job) => job.tenant_id.as_deref(),
        }
    }
}

/// Snapshot of a tenant taken by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorTenantJob {
    pub tenant_id: String,
    pub settings: TenantSettings,
    pub credentials: TenantCredentials,
    /// Tick that queued the pass. Stamped as the tenant's last run.
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessCommentJob {
    pub tenant_id: String,
    pub platform: Platform,
    pub comment: Comment,
    pub post: Post,
    pub settings: TenantSettings,
    pub access_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchDeleteJob {
    /// Absent for manual sweeps that are not tied to a stored tenant.
    #[serde(default)]
    pub tenant_id: Option<String>,
    pub platform: Platform,
    pub comment_ids: Vec<String>,
    pub access_token: String,
}

/// Per-platform counters from one monitoring pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformScan {
    pub posts_scanned: u64,
    pub comments_seen: u64,
    pub queued: u64,
    pub skipped: u64,
    pub processed: u64,
    pub deleted: u64,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorSummary {
    pub tenant_id: String,
    pub instagram: PlatformScan,
    pub facebook: PlatformScan,
}

impl MonitorSummary {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            ..Default::default()
        }
    }

    pub fn platform_mut(&mut self, platform: Platform) -> &mut PlatformScan {
        match platform {
            Platform::Instagram => &mut self.instagram,
            Platform::Facebook => &mut self.facebook,
        }
    }

    pub fn platform(&self, platform: Platform) -> &PlatformScan {
        match platform {
            Platform::Instagram => &self.instagram,
            Platform::Facebook => &self.facebook,
        }
    }

    pub fn total_posts_scanned(&self) -> u64 {
        self.instagram.posts_scanned + self.facebook.posts_scanned
    }

    pub fn total_processed(&self) -> u64 {
        self.instagram.processed + self.facebook.processed
    }

    pub fn total_deleted(&self) -> u64 {
        self.instagram.deleted + self.facebook.deleted
    }
}

/// Result of processing one comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessOutcome {
    pub comment_id: String,
    pub action: ActionType,
    pub success: bool,
    pub suspicious_score: u8,
    /// True when the comment had already been recorded and nothing was done.
    #[serde(default)]
    pub duplicate: bool,
}

impl ProcessOutcome {
    pub fn duplicate(comment_id: impl Into<String>) -> Self {
        Self {
            comment_id: comment_id.into(),
            action: ActionType::None,
            success: true,
            suspicious_score: 0,
            duplicate: true,
        }
    }

    pub fn deleted(&self) -> bool {
        self.action == ActionType::Delete && self.success && !self.duplicate
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchDeleteError {
    pub comment_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchDeleteSummary {
    pub total: u64,
    pub deleted: u64,
    pub failed: u64,
    pub errors: Vec<BatchDeleteError>,
}
