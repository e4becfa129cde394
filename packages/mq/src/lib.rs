pub mod config;
pub mod error;
pub mod events;
pub mod handler;
pub mod models;
pub mod queue;

pub use config::{JobQueueBuilder, QueueSpec};
pub use error::{JobError, MqError};
pub use events::{QueueEvent, spawn_event_logger};
pub use handler::{HandlerError, JobHandler};
pub use models::{JobContext, JobCounts, JobHandle, JobId, JobOptions, JobRecord, JobState};
pub use queue::JobQueue;
