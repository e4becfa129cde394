use common::config::QueueConfig;
use common::mq::JobMessage;

use crate::models::JobOptions;
use crate::queue::JobQueue;

/// A named queue and the size of its worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueSpec {
    pub name: &'static str,
    pub concurrency: usize,
}

#[derive(Debug, Clone)]
pub struct JobQueueBuilder {
    specs: Vec<QueueSpec>,
    channel_capacity: usize,
    default_options: JobOptions,
}

impl Default for JobQueueBuilder {
    fn default() -> Self {
        Self {
            specs: Vec::new(),
            channel_capacity: 1024,
            default_options: JobOptions::default(),
        }
    }
}

impl JobQueueBuilder {
    /// Builder preloaded with capacity, attempts and backoff from `config`.
    pub fn from_config(config: &QueueConfig) -> Self {
        Self::default()
            .channel_capacity(config.channel_capacity)
            .default_options(JobOptions {
                max_attempts: config.max_attempts,
                backoff: config.backoff(),
            })
    }

    pub fn queue(mut self, name: &'static str, concurrency: usize) -> Self {
        self.specs.retain(|s| s.name != name);
        self.specs.push(QueueSpec {
            name,
            concurrency: concurrency.max(1),
        });
        self
    }

    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    pub fn default_options(mut self, options: JobOptions) -> Self {
        self.default_options = JobOptions {
            max_attempts: options.max_attempts.max(1),
            ..options
        };
        self
    }

    pub fn build<M: JobMessage>(self) -> JobQueue<M> {
        JobQueue::from_builder(self.specs, self.channel_capacity, self.default_options)
    }
}
