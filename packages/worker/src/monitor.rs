use std::sync::Arc;

use api_client::PlatformApi;
use common::comment::CommentKey;
use common::config::MonitorConfig;
use common::event::{Event, NotificationEvent};
use common::job::{JobPayload, MonitorSummary, MonitorTenantJob, PlatformScan, ProcessCommentJob, ProcessOutcome};
use common::platform::Platform;
use common::social::Comment;
use common::storage::{CommentStore, TenantSource};
use common::tenant::PlatformCredential;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use mq::{JobHandle, JobQueue};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::error::Result;
use crate::notify::NotificationSink;

/// One monitoring pass over a tenant's recent posts.
pub struct Monitor {
    api: Arc<dyn PlatformApi>,
    comments: Arc<dyn CommentStore>,
    tenants: Arc<dyn TenantSource>,
    queue: JobQueue<JobPayload>,
    notifier: Arc<dyn NotificationSink>,
    config: MonitorConfig,
}

/// Why a fetched comment was not queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyRecorded,
    OwnComment,
    Whitelisted,
}

impl Monitor {
    pub fn new(
        api: Arc<dyn PlatformApi>,
        comments: Arc<dyn CommentStore>,
        tenants: Arc<dyn TenantSource>,
        queue: JobQueue<JobPayload>,
        notifier: Arc<dyn NotificationSink>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            api,
            comments,
            tenants,
            queue,
            notifier,
            config,
        }
    }

    /// Scans every monitored platform, queues new comments for processing
    /// and waits for them to settle so the pass can report deletions.
    ///
    /// A platform that fails is recorded in its scan's `errors` and the
    /// other platform still runs. A rejected token also asks the tenant to
    /// reauthorize. Only a closed queue fails the pass.
    #[instrument(skip_all, fields(tenant_id = %job.tenant_id))]
    pub async fn run(&self, job: &MonitorTenantJob) -> Result<MonitorSummary> {
        let mut summary = MonitorSummary::new(&job.tenant_id);
        let mut pending = Vec::new();

        for platform in Platform::ALL {
            if !job.settings.monitors(platform) {
                continue;
            }
            let Some(credential) = job.credentials.for_platform(platform) else {
                debug!(%platform, "No credentials, skipping platform");
                continue;
            };
            let scan = summary.platform_mut(platform);
            if let Err(e) = self
                .scan_platform(job, platform, credential, scan, &mut pending)
                .await
            {
                if e.is_fatal() {
                    return Err(e);
                }
                warn!(%platform, error = %e, "Platform scan failed");
                scan.errors.push(e.to_string());
                if e.is_authorization() {
                    self.notifier.emit(
                        &job.tenant_id,
                        NotificationEvent::ReauthorizationRequired {
                            platform,
                            error: e.to_string(),
                        }
                        .to_generic_event(),
                    );
                }
            }
        }

        self.settle(pending, &mut summary).await;

        if let Err(e) = self
            .tenants
            .update_usage(
                &job.tenant_id,
                summary.total_processed(),
                summary.total_deleted(),
                summary.total_posts_scanned(),
                job.scheduled_at,
            )
            .await
        {
            warn!(error = %e, "Failed to update usage counters");
        }

        if summary.total_deleted() > 0 && job.settings.notify_on_deletion {
            self.notifier.emit(
                &job.tenant_id,
                NotificationEvent::deletion_summary(&summary).to_generic_event(),
            );
        }

        info!(
            posts_scanned = summary.total_posts_scanned(),
            processed = summary.total_processed(),
            deleted = summary.total_deleted(),
            "Monitoring pass finished"
        );
        Ok(summary)
    }

    async fn scan_platform(
        &self,
        job: &MonitorTenantJob,
        platform: Platform,
        credential: PlatformCredential<'_>,
        scan: &mut PlatformScan,
        pending: &mut Vec<(Platform, JobHandle)>,
    ) -> Result<()> {
        let posts = self
            .api
            .list_recent_posts(
                platform,
                credential.account_id,
                credential.access_token,
                self.config.posts_per_scan,
            )
            .await?;

        for post in posts {
            scan.posts_scanned += 1;
            let comments = match self
                .api
                .list_comments(
                    platform,
                    &post.id,
                    credential.access_token,
                    self.config.comments_per_post,
                )
                .await
            {
                Ok(comments) => comments,
                Err(e) if e.is_authorization() => return Err(e.into()),
                Err(e) => {
                    warn!(%platform, post_id = %post.id, error = %e, "Failed to list comments");
                    scan.errors.push(format!("post {}: {e}", post.id));
                    continue;
                }
            };

            for comment in comments.into_iter().flat_map(Comment::flatten) {
                scan.comments_seen += 1;
                if let Some(reason) = self.skip_reason(job, platform, credential, &comment).await? {
                    debug!(comment_id = %comment.id, ?reason, "Comment skipped");
                    scan.skipped += 1;
                    continue;
                }

                let handle = self
                    .queue
                    .enqueue(JobPayload::ProcessComment(ProcessCommentJob {
                        tenant_id: job.tenant_id.clone(),
                        platform,
                        comment,
                        post: post.clone(),
                        settings: job.settings.clone(),
                        access_token: credential.access_token.to_string(),
                    }))
                    .await?;
                scan.queued += 1;
                pending.push((platform, handle));
            }
        }
        Ok(())
    }

    /// Eligibility filter, checked in order: recorded, owner, whitelisted.
    async fn skip_reason(
        &self,
        job: &MonitorTenantJob,
        platform: Platform,
        credential: PlatformCredential<'_>,
        comment: &Comment,
    ) -> Result<Option<SkipReason>> {
        if self
            .comments
            .exists(&CommentKey::new(platform, comment.id.clone()))
            .await?
        {
            return Ok(Some(SkipReason::AlreadyRecorded));
        }
        if comment.is_authored_by(credential.account_id) {
            return Ok(Some(SkipReason::OwnComment));
        }
        if comment
            .author_id
            .as_deref()
            .is_some_and(|author| job.settings.is_whitelisted(author))
        {
            return Ok(Some(SkipReason::Whitelisted));
        }
        Ok(None)
    }

    /// Collects process outcomes until all finish or the settle timeout hits.
    async fn settle(&self, pending: Vec<(Platform, JobHandle)>, summary: &mut MonitorSummary) {
        let total = pending.len();
        let mut waiting: FuturesUnordered<_> = pending
            .into_iter()
            .map(|(platform, handle)| async move { (platform, handle.wait_as::<ProcessOutcome>().await) })
            .collect();

        let deadline = Instant::now() + self.config.settle_timeout();
        let mut settled = 0;
        loop {
            match tokio::time::timeout_at(deadline, waiting.next()).await {
                Ok(Some((platform, result))) => {
                    settled += 1;
                    let scan = summary.platform_mut(platform);
                    match result {
                        Ok(outcome) if outcome.duplicate => {}
                        Ok(outcome) => {
                            scan.processed += 1;
                            if outcome.deleted() {
                                scan.deleted += 1;
                            }
                        }
                        Err(e) => scan.errors.push(e.to_string()),
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    warn!(settled, total, "Process jobs did not settle before timeout");
                    break;
                }
            }
        }
    }
}
