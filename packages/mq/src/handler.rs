use async_trait::async_trait;
use common::mq::JobMessage;
use thiserror::Error;

use crate::models::JobContext;

/// Outcome class of a failed handler attempt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// Retried with backoff until attempts run out.
    #[error("{0}")]
    Transient(String),

    /// Fails the job immediately.
    #[error("{0}")]
    Permanent(String),
}

impl HandlerError {
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent(_))
    }
}

/// Processes payloads delivered by the queue. One attempt at a time per job.
#[async_trait]
pub trait JobHandler<M: JobMessage>: Send + Sync {
    async fn handle(&self, ctx: JobContext, payload: M) -> Result<serde_json::Value, HandlerError>;
}
