use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::models::JobId;

/// Lifecycle notifications, for observability only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueEvent {
    Enqueued {
        queue: &'static str,
        job_id: JobId,
    },
    Active {
        queue: &'static str,
        job_id: JobId,
        attempt: u32,
    },
    Completed {
        queue: &'static str,
        job_id: JobId,
    },
    Retrying {
        queue: &'static str,
        job_id: JobId,
        attempt: u32,
        delay: Duration,
        error: String,
    },
    Failed {
        queue: &'static str,
        job_id: JobId,
        attempts: u32,
        error: String,
    },
    Removed {
        queue: &'static str,
        job_id: JobId,
    },
}

/// Logs every queue event until the queue's sender is dropped.
pub fn spawn_event_logger(mut rx: broadcast::Receiver<QueueEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Queue event logger lagged behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn log_event(event: &QueueEvent) {
    match event {
        QueueEvent::Enqueued { queue, job_id } => debug!(queue, job_id = %job_id, "Job enqueued"),
        QueueEvent::Active {
            queue,
            job_id,
            attempt,
        } => debug!(queue, job_id = %job_id, attempt, "Job started"),
        QueueEvent::Completed { queue, job_id } => info!(queue, job_id = %job_id, "Job completed"),
        QueueEvent::Retrying {
            queue,
            job_id,
            attempt,
            delay,
            error,
        } => warn!(
            queue,
            job_id = %job_id,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Retrying job"
        ),
        QueueEvent::Failed {
            queue,
            job_id,
            attempts,
            error,
        } => error!(queue, job_id = %job_id, attempts, error = %error, "Job failed"),
        QueueEvent::Removed { queue, job_id } => info!(queue, job_id = %job_id, "Job removed"),
    }
}
