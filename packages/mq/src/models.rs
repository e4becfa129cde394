use chrono::{DateTime, Utc};
use common::retry::{Backoff, RetryAttempt};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::error::JobError;

pub type JobId = Uuid;

pub(crate) type JobOutcome = Result<serde_json::Value, JobError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Waiting,
    Delayed,
    Active,
    Completed,
    Failed,
    Removed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Removed)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Waiting | Self::Delayed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobOptions {
    /// Attempts including the first. Default: 3.
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::default(),
        }
    }
}

/// Per-attempt information passed to a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobContext {
    pub job_id: JobId,
    pub queue: &'static str,
    /// 1-based.
    pub attempt: u32,
    pub max_attempts: u32,
}

impl JobContext {
    pub fn is_retry(&self) -> bool {
        self.attempt > 1
    }

    /// A failure of this attempt fails the job.
    pub fn is_last_attempt(&self) -> bool {
        self.attempt >= self.max_attempts
    }
}

/// Inspection view of a job.
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord<M> {
    pub id: JobId,
    pub queue: &'static str,
    pub payload: M,
    pub state: JobState,
    pub attempts_made: u32,
    pub max_attempts: u32,
    pub history: Vec<RetryAttempt>,
    pub result: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobCounts {
    pub waiting: u64,
    pub delayed: u64,
    pub active: u64,
    pub completed: u64,
    pub failed: u64,
}

impl JobCounts {
    pub(crate) fn add(&mut self, state: JobState) {
        match state {
            JobState::Waiting => self.waiting += 1,
            JobState::Delayed => self.delayed += 1,
            JobState::Active => self.active += 1,
            JobState::Completed => self.completed += 1,
            JobState::Failed => self.failed += 1,
            JobState::Removed => {}
        }
    }

    pub fn pending(&self) -> u64 {
        self.waiting + self.delayed + self.active
    }
}

/// Returned by enqueue. Resolves once the job reaches a terminal state.
#[derive(Debug)]
pub struct JobHandle {
    id: JobId,
    queue: &'static str,
    rx: oneshot::Receiver<JobOutcome>,
}

impl JobHandle {
    pub(crate) fn new(id: JobId, queue: &'static str, rx: oneshot::Receiver<JobOutcome>) -> Self {
        Self { id, queue, rx }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn queue(&self) -> &'static str {
        self.queue
    }

    pub async fn wait(self) -> Result<serde_json::Value, JobError> {
        self.rx.await.unwrap_or(Err(JobError::Dropped))
    }

    /// Waits and decodes the handler's return value.
    pub async fn wait_as<T: DeserializeOwned>(self) -> Result<T, JobError> {
        let value = self.wait().await?;
        serde_json::from_value(value).map_err(|e| JobError::Decode(e.to_string()))
    }
}
