use thiserror::Error;

/// Infrastructure errors of the queue itself.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MqError {
    #[error("Queue is shut down")]
    Closed,

    #[error("Queue not found: {0}")]
    UnknownQueue(String),

    #[error("Workers already started")]
    AlreadyStarted,

    #[error("{0}")]
    Internal(String),
}

impl MqError {
    /// Errors after which enqueueing can never succeed again.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Closed | Self::UnknownQueue(_))
    }
}

/// Terminal failure of a single job, as seen through its handle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JobError {
    #[error("Job failed after {attempts} attempt(s): {error}")]
    Failed { attempts: u32, error: String },

    #[error("Job was removed before it ran")]
    Removed,

    #[error("Job was dropped by a shutting down queue")]
    Dropped,

    #[error("Job result could not be decoded: {0}")]
    Decode(String),
}
