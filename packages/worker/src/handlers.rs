use std::sync::Arc;

use async_trait::async_trait;
use common::job::JobPayload;
use mq::{HandlerError, JobContext, JobHandler};
use serde::Serialize;
use tracing::debug;

use crate::batch::BatchDeleter;
use crate::monitor::Monitor;
use crate::processor::CommentProcessor;

/// Routes each job payload to the component that handles it.
pub struct PipelineHandler {
    monitor: Arc<Monitor>,
    processor: Arc<CommentProcessor>,
    batch: Arc<BatchDeleter>,
}

impl PipelineHandler {
    pub fn new(monitor: Arc<Monitor>, processor: Arc<CommentProcessor>, batch: Arc<BatchDeleter>) -> Self {
        Self {
            monitor,
            processor,
            batch,
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, HandlerError> {
    serde_json::to_value(value).map_err(|e| HandlerError::Permanent(e.to_string()))
}

#[async_trait]
impl JobHandler<JobPayload> for PipelineHandler {
    async fn handle(&self, ctx: JobContext, payload: JobPayload) -> Result<serde_json::Value, HandlerError> {
        debug!(queue = ctx.queue, job_id = %ctx.job_id, attempt = ctx.attempt, "Handling job");
        match payload {
            JobPayload::MonitorTenant(job) => {
                let summary = self.monitor.run(&job).await?;
                to_json(&summary)
            }
            JobPayload::ProcessComment(job) => match self.processor.process(&job, ctx.is_retry()).await {
                Ok(outcome) => to_json(&outcome),
                Err(e) => {
                    let err = HandlerError::from(e);
                    if err.is_permanent() || ctx.is_last_attempt() {
                        self.processor.abandon(&job, &err.to_string()).await;
                    }
                    Err(err)
                }
            },
            JobPayload::BatchDelete(job) => {
                let summary = self.batch.run(&job).await;
                to_json(&summary)
            }
        }
    }
}
