use std::sync::Arc;

use api_client::PlatformApi;
use common::job::{BatchDeleteJob, BatchDeleteSummary, JobPayload};
use common::platform::Platform;
use common::social::Comment;
use mq::JobQueue;
use serde::Deserialize;
use tracing::info;

use crate::error::{Result, WorkerError};

/// Manual request to delete the replies under a post or comment.
#[derive(Debug, Clone, Deserialize)]
pub struct SweepRequest {
    pub platform: Platform,
    pub parent_id: String,
    pub access_token: String,
    /// Replies by this account are kept.
    #[serde(default)]
    pub owner_account_id: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

#[derive(Clone)]
pub struct Sweeper {
    api: Arc<dyn PlatformApi>,
    queue: JobQueue<JobPayload>,
    comment_limit: u32,
}

impl Sweeper {
    pub fn new(api: Arc<dyn PlatformApi>, queue: JobQueue<JobPayload>, comment_limit: u32) -> Self {
        Self {
            api,
            queue,
            comment_limit,
        }
    }

    /// Ids of the replies a sweep would delete.
    ///
    /// Instagram returns replies nested under top-level comments; Facebook
    /// returns them flat with a parent.
    pub async fn collect_targets(&self, request: &SweepRequest) -> Result<Vec<String>> {
        let comments = self
            .api
            .list_comments(
                request.platform,
                &request.parent_id,
                &request.access_token,
                self.comment_limit,
            )
            .await?;

        let replies: Vec<Comment> = match request.platform {
            Platform::Instagram => comments.into_iter().flat_map(|c| c.replies).collect(),
            Platform::Facebook => comments.into_iter().filter(Comment::is_reply).collect(),
        };
        let owner = request.owner_account_id.as_deref().filter(|id| !id.is_empty());

        Ok(replies
            .into_iter()
            .filter(|reply| !owner.is_some_and(|owner| reply.is_authored_by(owner)))
            .map(|reply| reply.id)
            .collect())
    }

    /// Queues the replies for deletion and waits for the batch summary.
    pub async fn sweep(&self, request: &SweepRequest) -> Result<BatchDeleteSummary> {
        if request.parent_id.trim().is_empty() {
            return Err(WorkerError::Validation("parent_id is required".into()));
        }
        if request.access_token.is_empty() {
            return Err(WorkerError::Validation("access_token is required".into()));
        }

        let comment_ids = self.collect_targets(request).await?;
        if comment_ids.is_empty() {
            info!(platform = %request.platform, parent_id = %request.parent_id, "Nothing to sweep");
            return Ok(BatchDeleteSummary::default());
        }

        let handle = self
            .queue
            .enqueue(JobPayload::BatchDelete(BatchDeleteJob {
                tenant_id: request.tenant_id.clone(),
                platform: request.platform,
                comment_ids,
                access_token: request.access_token.clone(),
            }))
            .await?;
        let summary: BatchDeleteSummary = handle.wait_as().await?;

        info!(
            platform = %request.platform,
            parent_id = %request.parent_id,
            total = summary.total,
            deleted = summary.deleted,
            "Sweep completed"
        );
        Ok(summary)
    }
}
