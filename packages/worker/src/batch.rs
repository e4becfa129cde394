use std::sync::Arc;
use std::time::Duration;

use api_client::PlatformApi;
use chrono::Utc;
use common::comment::{ActionRecord, ActionType, CommentKey};
use common::comment_status::CommentStatus;
use common::job::{BatchDeleteError, BatchDeleteJob, BatchDeleteSummary};
use common::storage::CommentStore;
use tracing::{info, instrument, warn};

/// Deletes a list of comments one at a time, pausing between deletions.
pub struct BatchDeleter {
    api: Arc<dyn PlatformApi>,
    comments: Arc<dyn CommentStore>,
    delay: Duration,
}

impl BatchDeleter {
    pub fn new(api: Arc<dyn PlatformApi>, comments: Arc<dyn CommentStore>, delay: Duration) -> Self {
        Self {
            api,
            comments,
            delay,
        }
    }

    /// Failures are collected into the summary; the batch always runs to the end.
    #[instrument(skip_all, fields(platform = %job.platform, total = job.comment_ids.len()))]
    pub async fn run(&self, job: &BatchDeleteJob) -> BatchDeleteSummary {
        let mut summary = BatchDeleteSummary {
            total: job.comment_ids.len() as u64,
            ..Default::default()
        };

        for (i, comment_id) in job.comment_ids.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let (status, action) = match self
                .api
                .delete_comment(job.platform, comment_id, &job.access_token)
                .await
            {
                Ok(()) => {
                    summary.deleted += 1;
                    (
                        CommentStatus::Deleted,
                        ActionRecord::succeeded(ActionType::Delete, Utc::now())
                            .with_reason("batch delete"),
                    )
                }
                Err(e) => {
                    warn!(%comment_id, error = %e, "Batch delete failed");
                    summary.failed += 1;
                    summary.errors.push(BatchDeleteError {
                        comment_id: comment_id.clone(),
                        error: e.to_string(),
                    });
                    (
                        CommentStatus::Flagged,
                        ActionRecord::failed(ActionType::Delete, e.to_string(), Utc::now())
                            .with_reason("batch delete"),
                    )
                }
            };

            // Comments swept without a prior monitoring pass have no record.
            let key = CommentKey::new(job.platform, comment_id.clone());
            if let Err(e) = self.comments.update_status(&key, status, &action).await {
                warn!(%comment_id, error = %e, "Failed to record batch delete outcome");
            }
        }

        info!(
            deleted = summary.deleted,
            failed = summary.failed,
            "Batch delete finished"
        );
        summary
    }
}
