use std::sync::Arc;
use std::time::Duration;

use common::comment_status::CommentStatus;
use common::config::CleanupConfig;
use common::job::JobPayload;
use common::storage::{CommentStore, TenantSource};
use mq::{JobQueue, JobState};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::scheduler::run_daily;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub records_deleted: u64,
    pub refresh_tokens_pruned: u64,
    pub jobs_pruned: usize,
    pub errors: Vec<String>,
}

/// Daily retention pass over comment records, tenant credentials and job history.
#[derive(Clone)]
pub struct Cleanup {
    comments: Arc<dyn CommentStore>,
    tenants: Arc<dyn TenantSource>,
    queue: JobQueue<JobPayload>,
    config: CleanupConfig,
}

impl Cleanup {
    pub fn new(
        comments: Arc<dyn CommentStore>,
        tenants: Arc<dyn TenantSource>,
        queue: JobQueue<JobPayload>,
        config: CleanupConfig,
    ) -> Self {
        Self {
            comments,
            tenants,
            queue,
            config,
        }
    }

    /// Each step runs even if an earlier one failed. Safe to run at any time.
    pub async fn run_once(&self) -> CleanupReport {
        let mut report = CleanupReport::default();

        match self
            .comments
            .delete_older_than(self.config.retention_days, &CommentStatus::PURGEABLE)
            .await
        {
            Ok(n) => report.records_deleted = n,
            Err(e) => {
                error!(error = %e, "Failed to purge old comment records");
                report.errors.push(format!("records: {e}"));
            }
        }

        match self.tenants.prune_expired_refresh_tokens().await {
            Ok(n) => report.refresh_tokens_pruned = n,
            Err(e) => {
                error!(error = %e, "Failed to prune expired refresh tokens");
                report.errors.push(format!("refresh tokens: {e}"));
            }
        }

        let history: [(JobState, Duration); 3] = [
            (JobState::Completed, self.config.completed_job_retention()),
            (JobState::Removed, self.config.completed_job_retention()),
            (JobState::Failed, self.config.failed_job_retention()),
        ];
        for (state, grace) in history {
            report.jobs_pruned += self.queue.clean(grace, state).await;
        }

        info!(
            records_deleted = report.records_deleted,
            refresh_tokens_pruned = report.refresh_tokens_pruned,
            jobs_pruned = report.jobs_pruned,
            "Cleanup finished"
        );
        report
    }

    pub async fn run_daily(self, cancel: CancellationToken) {
        let this = &self;
        run_daily("cleanup", self.config.hour_utc, cancel, move || async move {
            this.run_once().await;
        })
        .await;
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration as ChronoDuration, Utc};
    use common::comment::{CommentKey, CommentRecord};
    use common::platform::Platform;
    use common::social::{Comment, Post};
    use common::tenant::RefreshToken;

    use super::*;
    use crate::pipeline::Pipeline;
    use crate::testing::{FakeApi, FixedPolicy, Harness, active_tenant};

    fn old_record(id: &str, status: CommentStatus, days_old: i64) -> CommentRecord {
        let now = Utc::now();
        let mut record = CommentRecord::discovered(
            "t1",
            Platform::Instagram,
            &Comment::new(id, "text"),
            &Post::new("p1"),
            now,
        );
        record.discovered_at = now - ChronoDuration::days(days_old);
        record.status = status;
        record
    }

    #[tokio::test(start_paused = true)]
    async fn purges_old_resolved_records_and_expired_history() {
        let h = Harness::new(FakeApi::new());
        h.comments.put(old_record("old-deleted", CommentStatus::Deleted, 120)).await;
        h.comments.put(old_record("old-flagged", CommentStatus::Flagged, 120)).await;
        h.comments.put(old_record("recent", CommentStatus::Processed, 10)).await;
        let mut reviewed = old_record("reviewed", CommentStatus::Processed, 120);
        reviewed.manual_review.is_reviewed = true;
        h.comments.put(reviewed).await;

        let mut tenant = active_tenant("t1");
        tenant.credentials.refresh_tokens = vec![
            RefreshToken {
                token: "stale".into(),
                expires_at: Utc::now() - ChronoDuration::days(1),
            },
            RefreshToken {
                token: "fresh".into(),
                expires_at: Utc::now() + ChronoDuration::days(1),
            },
        ];
        h.tenants.insert(tenant).await;

        let pipeline =
            Pipeline::start(h.deps(FixedPolicy::authorized(0)), &Default::default()).unwrap();
        pipeline
            .queue()
            .enqueue(JobPayload::BatchDelete(common::job::BatchDeleteJob {
                tenant_id: None,
                platform: Platform::Facebook,
                comment_ids: vec!["x".into()],
                access_token: "tok".into(),
            }))
            .await
            .unwrap()
            .wait()
            .await
            .unwrap();

        let first = pipeline.cleanup().run_once().await;
        assert_eq!(first.records_deleted, 1);
        assert_eq!(first.refresh_tokens_pruned, 1);
        assert_eq!(first.jobs_pruned, 0);
        assert!(first.errors.is_empty());

        tokio::time::advance(Duration::from_secs(25 * 3600)).await;
        let later = pipeline.cleanup().run_once().await;
        assert_eq!(later.records_deleted, 0);
        assert_eq!(later.jobs_pruned, 1);

        let key = |id: &str| CommentKey::new(Platform::Instagram, id);
        assert!(h.comments.get(&key("old-deleted")).await.unwrap().is_none());
        assert!(h.comments.get(&key("old-flagged")).await.unwrap().is_some());
        assert!(h.comments.get(&key("reviewed")).await.unwrap().is_some());
        assert!(h.comments.get(&key("recent")).await.unwrap().is_some());
        pipeline.shutdown().await;
    }
}
