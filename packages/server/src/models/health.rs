use serde::Serialize;
use worker::PipelineHealth;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    /// Serving requests, but the scheduler loop is not running.
    Degraded,
    /// The job queue no longer accepts work.
    Down,
}

impl HealthStatus {
    pub fn of(health: &PipelineHealth) -> Self {
        if health.queue_closed {
            Self::Down
        } else if !health.scheduler_running {
            Self::Degraded
        } else {
            Self::Ok
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    #[serde(flatten)]
    pub pipeline: PipelineHealth,
}
