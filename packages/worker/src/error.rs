use api_client::ApiError;
use common::platform::Platform;
use common::storage::StorageError;
use mq::{HandlerError, JobError, MqError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("MQ error: {0}")]
    Mq(#[from] MqError),

    #[error("Job error: {0}")]
    Job(#[from] JobError),

    #[error("No usable {0} credentials")]
    MissingCredentials(Platform),

    #[error("Tenant not found: {0}")]
    TenantNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl WorkerError {
    /// Queue infrastructure failures that must stop the scheduler.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Mq(e) if e.is_fatal())
    }

    /// The platform rejected the access token.
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::Api(e) if e.is_authorization())
    }
}

/// Transient failures are retried by the queue; everything else fails the job.
impl From<WorkerError> for HandlerError {
    fn from(err: WorkerError) -> Self {
        let transient = match &err {
            WorkerError::Api(e) => e.is_transient(),
            WorkerError::Storage(StorageError::NotFound(_)) => false,
            WorkerError::Storage(_) => true,
            WorkerError::Mq(e) => !e.is_fatal(),
            WorkerError::Job(JobError::Failed { .. }) => true,
            WorkerError::Job(_) => false,
            WorkerError::MissingCredentials(_)
            | WorkerError::TenantNotFound(_)
            | WorkerError::Validation(_) => false,
        };
        if transient {
            HandlerError::Transient(err.to_string())
        } else {
            HandlerError::Permanent(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, WorkerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limits_are_transient_and_bad_tokens_are_not() {
        let limited = WorkerError::Api(ApiError::RateLimited {
            status: 429,
            code: None,
            message: "slow".into(),
        });
        assert!(!HandlerError::from(limited).is_permanent());

        let expired = WorkerError::Api(ApiError::Unauthorized {
            status: 400,
            code: Some(190),
            message: "expired".into(),
        });
        assert!(HandlerError::from(expired).is_permanent());

        let invalid = WorkerError::Validation("missing comment id".into());
        assert!(HandlerError::from(invalid).is_permanent());
    }

    #[test]
    fn closed_queue_is_fatal() {
        assert!(WorkerError::Mq(MqError::Closed).is_fatal());
        assert!(!WorkerError::Validation("x".into()).is_fatal());
    }

    #[test]
    fn rejected_token_is_an_authorization_error() {
        let expired = WorkerError::Api(ApiError::Unauthorized {
            status: 400,
            code: Some(190),
            message: "expired".into(),
        });
        assert!(expired.is_authorization());
        assert!(!WorkerError::Validation("x".into()).is_authorization());
    }
}
