use std::sync::Arc;

use api_client::PlatformApi;
use chrono::Utc;
use common::comment::{ActionRecord, ActionType, CommentKey, CommentRecord};
use common::comment_status::CommentStatus;
use common::event::{Event, NotificationEvent};
use common::job::{ProcessCommentJob, ProcessOutcome};
use common::storage::CommentStore;
use common::tenant::TenantSettings;
use tracing::{debug, error, info, instrument, warn};

use crate::analysis::{AnalysisPolicy, AnalysisVerdict};
use crate::error::{Result, WorkerError};
use crate::notify::NotificationSink;

/// Picks the action for an analyzed comment.
///
/// Deleting unauthorized comments wins over flagging; a score strictly above
/// `flag_threshold` flags.
pub fn decide(settings: &TenantSettings, verdict: &AnalysisVerdict, flag_threshold: u8) -> ActionType {
    if settings.delete_unauthorized_comments && !verdict.is_authorized {
        ActionType::Delete
    } else if verdict.suspicious_score > flag_threshold {
        ActionType::Flag
    } else {
        ActionType::None
    }
}

pub struct CommentProcessor {
    store: Arc<dyn CommentStore>,
    api: Arc<dyn PlatformApi>,
    policy: Arc<dyn AnalysisPolicy>,
    notifier: Arc<dyn NotificationSink>,
    flag_threshold: u8,
}

impl CommentProcessor {
    pub fn new(
        store: Arc<dyn CommentStore>,
        api: Arc<dyn PlatformApi>,
        policy: Arc<dyn AnalysisPolicy>,
        notifier: Arc<dyn NotificationSink>,
        flag_threshold: u8,
    ) -> Self {
        Self {
            store,
            api,
            policy,
            notifier,
            flag_threshold,
        }
    }

    /// Analyzes one comment, acts on it and records the result.
    ///
    /// The record is claimed with insert-if-absent before any remote action,
    /// so a comment delivered twice is acted on once. A retry of the job that
    /// made the claim resumes it while the record is still pending; a delete
    /// that finds the comment already gone then counts as done, since the
    /// earlier attempt may have deleted it before failing to save.
    #[instrument(skip_all, fields(tenant_id = %job.tenant_id, platform = %job.platform, comment_id = %job.comment.id))]
    pub async fn process(&self, job: &ProcessCommentJob, is_retry: bool) -> Result<ProcessOutcome> {
        if job.comment.id.trim().is_empty() {
            return Err(WorkerError::Validation("comment id is empty".into()));
        }
        if job.access_token.is_empty() {
            return Err(WorkerError::MissingCredentials(job.platform));
        }

        let now = Utc::now();
        let mut record =
            CommentRecord::discovered(&job.tenant_id, job.platform, &job.comment, &job.post, now);

        let resumed = !self.store.insert_if_absent(&record).await?.inserted;
        if resumed {
            let resumable = is_retry
                && self
                    .store
                    .get(&record.key())
                    .await?
                    .is_some_and(|existing| existing.status == CommentStatus::Pending);
            if !resumable {
                debug!("Comment already recorded, skipping");
                return Ok(ProcessOutcome::duplicate(&job.comment.id));
            }
        }

        let verdict = self.policy.analyze(&record, &job.settings).await;
        let action = decide(&job.settings, &verdict, self.flag_threshold);
        let reason = verdict
            .flags
            .iter()
            .map(|f| f.reason.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        verdict.apply_to(&mut record.analysis);

        let (status, mut action_record) = match action {
            ActionType::Delete => {
                match self
                    .api
                    .delete_comment(job.platform, &job.comment.id, &job.access_token)
                    .await
                {
                    Ok(()) => (
                        CommentStatus::Deleted,
                        ActionRecord::succeeded(ActionType::Delete, Utc::now()),
                    ),
                    Err(e) if resumed && e.is_not_found() => {
                        debug!("Comment already gone on resumed claim");
                        (
                            CommentStatus::Deleted,
                            ActionRecord::succeeded(ActionType::Delete, Utc::now()),
                        )
                    }
                    Err(e) => {
                        warn!(error = %e, "Delete failed, flagging comment instead");
                        (
                            CommentStatus::Flagged,
                            ActionRecord::failed(ActionType::Delete, e.to_string(), Utc::now()),
                        )
                    }
                }
            }
            ActionType::Flag => (
                CommentStatus::Flagged,
                ActionRecord::succeeded(ActionType::Flag, Utc::now()),
            ),
            _ => (
                CommentStatus::Processed,
                ActionRecord::succeeded(ActionType::None, Utc::now()),
            ),
        };
        if !reason.is_empty() {
            action_record = action_record.with_reason(reason);
        }
        if is_retry {
            action_record.retry_count = 1;
        }

        record.status = status;
        record.action = action_record;
        record.processed_at = Some(Utc::now());
        self.store.save_outcome(&record).await?;

        self.notifier.emit(
            &job.tenant_id,
            NotificationEvent::comment_processed(&record).to_generic_event(),
        );
        info!(
            action = %record.action.action_type,
            success = record.action.success,
            score = record.analysis.suspicious_score,
            status = %record.status,
            "Comment processed"
        );

        Ok(ProcessOutcome {
            comment_id: record.comment_id,
            action: record.action.action_type,
            success: record.action.success,
            suspicious_score: record.analysis.suspicious_score,
            duplicate: false,
        })
    }

    /// Marks a claimed record `flagged` once its job has failed for good, so
    /// it surfaces for review instead of staying pending. Best effort.
    pub async fn abandon(&self, job: &ProcessCommentJob, error: &str) {
        let key = CommentKey::new(job.platform, job.comment.id.clone());
        match self.flag_if_pending(&key, error).await {
            Ok(true) => warn!(
                tenant_id = %job.tenant_id,
                comment_id = %job.comment.id,
                error,
                "Processing failed for good, comment flagged for review"
            ),
            Ok(false) => {}
            Err(e) => error!(
                tenant_id = %job.tenant_id,
                comment_id = %job.comment.id,
                error = %e,
                "Failed to flag abandoned comment"
            ),
        }
    }

    async fn flag_if_pending(&self, key: &CommentKey, error: &str) -> Result<bool> {
        match self.store.get(key).await? {
            Some(existing) if existing.status == CommentStatus::Pending => {
                let action = ActionRecord::failed(ActionType::None, error, Utc::now());
                Ok(self
                    .store
                    .update_status(key, CommentStatus::Flagged, &action)
                    .await?)
            }
            _ => Ok(false),
        }
    }
}
