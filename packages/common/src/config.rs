use std::time::Duration;

use serde::Deserialize;

use crate::retry::Backoff;

/// Monitoring pass configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct MonitorConfig {
    /// Scheduler tick. Default: 300 (5 minutes).
    #[serde(default = "default_monitor_interval_secs")]
    pub interval_secs: u64,
    /// Recent posts fetched per platform. Default: 10.
    #[serde(default = "default_posts_per_scan")]
    pub posts_per_scan: u32,
    /// Comments fetched per post. Default: 50.
    #[serde(default = "default_comments_per_post")]
    pub comments_per_post: u32,
    /// Upper bound on waiting for a pass's process jobs to settle. Default: 600.
    #[serde(default = "default_settle_timeout_secs")]
    pub settle_timeout_secs: u64,
}

fn default_monitor_interval_secs() -> u64 {
    300
}
fn default_posts_per_scan() -> u32 {
    10
}
fn default_comments_per_post() -> u32 {
    50
}
fn default_settle_timeout_secs() -> u64 {
    600
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_monitor_interval_secs(),
            posts_per_scan: default_posts_per_scan(),
            comments_per_post: default_comments_per_post(),
            settle_timeout_secs: default_settle_timeout_secs(),
        }
    }
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn settle_timeout(&self) -> Duration {
        Duration::from_secs(self.settle_timeout_secs)
    }
}

/// Job queue configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct QueueConfig {
    /// Buffered jobs per named queue. Default: 1024.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Default: 3.
    #[serde(default = "default_monitor_concurrency")]
    pub monitor_concurrency: usize,
    /// Default: 5.
    #[serde(default = "default_process_concurrency")]
    pub process_concurrency: usize,
    /// Default: 1.
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,
    /// Attempts per job including the first. Default: 3.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Default: 2000.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    /// Default: 60000.
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
}

fn default_channel_capacity() -> usize {
    1024
}
fn default_monitor_concurrency() -> usize {
    3
}
fn default_process_concurrency() -> usize {
    5
}
fn default_batch_concurrency() -> usize {
    1
}
fn default_max_attempts() -> u32 {
    3
}
fn default_backoff_base_ms() -> u64 {
    2000
}
fn default_backoff_max_ms() -> u64 {
    60_000
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            monitor_concurrency: default_monitor_concurrency(),
            process_concurrency: default_process_concurrency(),
            batch_concurrency: default_batch_concurrency(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
        }
    }
}

impl QueueConfig {
    pub fn backoff(&self) -> Backoff {
        Backoff::Exponential {
            base_ms: self.backoff_base_ms,
            max_ms: self.backoff_max_ms,
        }
    }
}

/// Daily cleanup configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct CleanupConfig {
    /// UTC hour the cleanup runs at. Default: 2.
    #[serde(default = "default_cleanup_hour_utc")]
    pub hour_utc: u32,
    /// Days a resolved record is kept. Default: 90.
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
    /// Default: 24.
    #[serde(default = "default_completed_job_retention_hours")]
    pub completed_job_retention_hours: u64,
    /// Default: 7.
    #[serde(default = "default_failed_job_retention_days")]
    pub failed_job_retention_days: u64,
}

fn default_cleanup_hour_utc() -> u32 {
    2
}
fn default_retention_days() -> i64 {
    90
}
fn default_completed_job_retention_hours() -> u64 {
    24
}
fn default_failed_job_retention_days() -> u64 {
    7
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            hour_utc: default_cleanup_hour_utc(),
            retention_days: default_retention_days(),
            completed_job_retention_hours: default_completed_job_retention_hours(),
            failed_job_retention_days: default_failed_job_retention_days(),
        }
    }
}

impl CleanupConfig {
    pub fn completed_job_retention(&self) -> Duration {
        Duration::from_secs(self.completed_job_retention_hours * 3600)
    }

    pub fn failed_job_retention(&self) -> Duration {
        Duration::from_secs(self.failed_job_retention_days * 86_400)
    }
}

/// Comment processing configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ProcessingConfig {
    /// Scores strictly above this are flagged. Default: 80.
    #[serde(default = "default_flag_threshold")]
    pub flag_threshold: u8,
    /// Pause between deletions in a batch. Default: 1000.
    #[serde(default = "default_batch_delete_delay_ms")]
    pub batch_delete_delay_ms: u64,
}

fn default_flag_threshold() -> u8 {
    80
}
fn default_batch_delete_delay_ms() -> u64 {
    1000
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            flag_threshold: default_flag_threshold(),
            batch_delete_delay_ms: default_batch_delete_delay_ms(),
        }
    }
}

impl ProcessingConfig {
    pub fn batch_delete_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delete_delay_ms)
    }
}

/// Pipeline configuration shared by the worker and the server binary.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct PipelineConfig {
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub cleanup: CleanupConfig,
    #[serde(default)]
    pub processing: ProcessingConfig,
}
