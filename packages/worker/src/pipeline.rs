use std::sync::Arc;

use api_client::PlatformApi;
use chrono::{DateTime, Utc};
use common::config::PipelineConfig;
use common::job::{JobPayload, QueueName};
use common::storage::{CommentStore, TenantSource};
use mq::{JobCounts, JobQueue, JobQueueBuilder, spawn_event_logger};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::analysis::AnalysisPolicy;
use crate::batch::BatchDeleter;
use crate::cleanup::Cleanup;
use crate::control::MonitoringControl;
use crate::error::Result;
use crate::handlers::PipelineHandler;
use crate::monitor::Monitor;
use crate::notify::NotificationSink;
use crate::processor::CommentProcessor;
use crate::scheduler::{Scheduler, SchedulerLiveness};
use crate::sweep::Sweeper;

/// External collaborators the pipeline is built from.
#[derive(Clone)]
pub struct PipelineDeps {
    pub api: Arc<dyn PlatformApi>,
    pub comments: Arc<dyn CommentStore>,
    pub tenants: Arc<dyn TenantSource>,
    pub policy: Arc<dyn AnalysisPolicy>,
    pub notifier: Arc<dyn NotificationSink>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueHealth {
    pub name: &'static str,
    pub counts: JobCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineHealth {
    pub scheduler_running: bool,
    pub scheduler_last_tick: Option<DateTime<Utc>>,
    pub queue_closed: bool,
    pub queues: Vec<QueueHealth>,
}

/// The running job queue with its workers, plus handles to the entry points
/// that sit on top of it.
pub struct Pipeline {
    queue: JobQueue<JobPayload>,
    scheduler: Scheduler,
    cleanup: Cleanup,
    sweeper: Sweeper,
    control: MonitoringControl,
    liveness: Arc<SchedulerLiveness>,
    workers: Vec<JoinHandle<()>>,
    cancel: CancellationToken,
}

impl Pipeline {
    /// Builds the queues and starts their workers. Must be called inside a
    /// tokio runtime. Timers are started separately with
    /// [`Pipeline::spawn_scheduler`] and [`Pipeline::spawn_cleanup`].
    pub fn start(deps: PipelineDeps, config: &PipelineConfig) -> Result<Self> {
        let queue: JobQueue<JobPayload> = JobQueueBuilder::from_config(&config.queue)
            .queue(QueueName::MonitorTenant.as_str(), config.queue.monitor_concurrency)
            .queue(QueueName::ProcessComment.as_str(), config.queue.process_concurrency)
            .queue(QueueName::BatchDelete.as_str(), config.queue.batch_concurrency)
            .build();

        let processor = Arc::new(CommentProcessor::new(
            deps.comments.clone(),
            deps.api.clone(),
            deps.policy.clone(),
            deps.notifier.clone(),
            config.processing.flag_threshold,
        ));
        let monitor = Arc::new(Monitor::new(
            deps.api.clone(),
            deps.comments.clone(),
            deps.tenants.clone(),
            queue.clone(),
            deps.notifier.clone(),
            config.monitor.clone(),
        ));
        let batch = Arc::new(BatchDeleter::new(
            deps.api.clone(),
            deps.comments.clone(),
            config.processing.batch_delete_delay(),
        ));

        let mut workers = queue.start(Arc::new(PipelineHandler::new(monitor, processor, batch)))?;
        workers.push(spawn_event_logger(queue.subscribe()));

        let scheduler = Scheduler::new(deps.tenants.clone(), queue.clone(), config.monitor.interval());
        let liveness = scheduler.liveness();
        info!("Pipeline started");

        Ok(Self {
            cleanup: Cleanup::new(
                deps.comments.clone(),
                deps.tenants.clone(),
                queue.clone(),
                config.cleanup.clone(),
            ),
            sweeper: Sweeper::new(deps.api.clone(), queue.clone(), config.monitor.comments_per_post),
            control: MonitoringControl::new(deps.tenants, queue.clone()),
            scheduler,
            liveness,
            queue,
            workers,
            cancel: CancellationToken::new(),
        })
    }

    pub fn queue(&self) -> &JobQueue<JobPayload> {
        &self.queue
    }

    pub fn sweeper(&self) -> &Sweeper {
        &self.sweeper
    }

    pub fn control(&self) -> &MonitoringControl {
        &self.control
    }

    pub fn cleanup(&self) -> &Cleanup {
        &self.cleanup
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Runs the scheduler loop until shutdown. The task ends early, with an
    /// error, only if the queue stops accepting jobs.
    pub fn spawn_scheduler(&self) -> JoinHandle<Result<()>> {
        let scheduler = self.scheduler.clone();
        let cancel = self.cancel.child_token();
        tokio::spawn(async move {
            let result = scheduler.run(cancel).await;
            if let Err(e) = &result {
                error!(error = %e, "Scheduler stopped");
            }
            result
        })
    }

    pub fn spawn_cleanup(&self) -> JoinHandle<()> {
        let cleanup = self.cleanup.clone();
        let cancel = self.cancel.child_token();
        tokio::spawn(cleanup.run_daily(cancel))
    }

    pub async fn health(&self) -> PipelineHealth {
        PipelineHealth {
            scheduler_running: self.liveness.is_running(),
            scheduler_last_tick: self.liveness.last_tick(),
            queue_closed: self.queue.is_closed(),
            queues: self
                .queue
                .all_counts()
                .await
                .into_iter()
                .map(|(name, counts)| QueueHealth { name, counts })
                .collect(),
        }
    }

    /// Stops timers and workers. Jobs still queued are dropped.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        self.queue.shutdown();
        for worker in self.workers {
            worker.abort();
            let _ = worker.await;
        }
        info!("Pipeline stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use common::comment_status::CommentStatus;
    use common::job::MonitorSummary;
    use common::platform::Platform;
    use common::social::{Comment, Post};

    use super::*;
    use crate::analysis::KeywordPolicy;
    use crate::testing::{FakeApi, Harness, active_tenant};

    #[tokio::test]
    async fn health_lists_every_queue() {
        let h = Harness::new(FakeApi::new());
        let pipeline = Pipeline::start(h.deps(KeywordPolicy), &PipelineConfig::default()).unwrap();

        let health = pipeline.health().await;

        let names: Vec<_> = health.queues.iter().map(|q| q.name).collect();
        assert_eq!(names, vec!["monitor-tenant", "process-comment", "batch-delete"]);
        assert!(!health.scheduler_running);
        assert!(!health.queue_closed);
        pipeline.shutdown().await;
    }

    #[tokio::test]
    async fn scheduled_tenant_is_monitored_end_to_end() {
        let api = FakeApi::new()
            .with_posts(Platform::Instagram, vec![Post::new("p1")])
            .with_comments("p1", vec![
                Comment::new("c1", "Great shot!").with_author("fan"),
                Comment::new("c2", "verify your account at https://bit.ly/x").with_author("bot"),
            ]);
        let h = Harness::new(api);
        let mut tenant = active_tenant("t1");
        tenant.settings.monitor_facebook = false;
        h.tenants.insert(tenant).await;

        let pipeline = Pipeline::start(h.deps(KeywordPolicy), &PipelineConfig::default()).unwrap();
        let mut events = pipeline.queue().subscribe();
        let scheduler = pipeline.spawn_scheduler();

        let summary = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Ok(mq::QueueEvent::Completed { queue: "monitor-tenant", job_id }) =
                    events.recv().await
                {
                    let record = pipeline.queue().get(job_id).await.unwrap();
                    let summary: MonitorSummary =
                        serde_json::from_value(record.result.unwrap()).unwrap();
                    return summary;
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(summary.instagram.processed, 2);
        assert_eq!(summary.instagram.deleted, 1);
        let c1 = h
            .comments
            .get(&common::comment::CommentKey::new(Platform::Instagram, "c1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(c1.status, CommentStatus::Processed);
        assert!(pipeline.health().await.scheduler_running);

        pipeline.shutdown().await;
        assert!(scheduler.await.unwrap().is_ok());
    }
}
