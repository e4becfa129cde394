pub mod analysis;
pub mod batch;
pub mod cleanup;
pub mod control;
pub mod error;
pub mod handlers;
pub mod monitor;
pub mod notify;
pub mod pipeline;
pub mod processor;
pub mod scheduler;
pub mod sweep;

#[cfg(test)]
mod testing;

pub use analysis::{AnalysisPolicy, AnalysisVerdict, KeywordPolicy};
pub use cleanup::{Cleanup, CleanupReport};
pub use control::{MonitoringControl, MonitoringStatus};
pub use error::{Result, WorkerError};
pub use notify::{BroadcastSink, NotificationSink, TenantEvent};
pub use pipeline::{Pipeline, PipelineDeps, PipelineHealth, QueueHealth};
pub use scheduler::{Scheduler, SchedulerLiveness};
pub use sweep::{SweepRequest, Sweeper};
