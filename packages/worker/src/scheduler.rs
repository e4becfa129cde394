use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};
use common::job::{JobPayload, MonitorTenantJob};
use common::storage::TenantSource;
use mq::JobQueue;
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::Result;

/// Last tick and running flag of the scheduler loop, read by health checks.
#[derive(Debug, Default)]
pub struct SchedulerLiveness {
    running: AtomicBool,
    last_tick_ms: AtomicI64,
}

impl SchedulerLiveness {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn last_tick(&self) -> Option<DateTime<Utc>> {
        match self.last_tick_ms.load(Ordering::Relaxed) {
            0 => None,
            ms => DateTime::from_timestamp_millis(ms),
        }
    }

    fn tick(&self, at: DateTime<Utc>) {
        self.last_tick_ms.store(at.timestamp_millis(), Ordering::Relaxed);
    }

    fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub eligible: usize,
    pub enqueued: usize,
    pub not_due: usize,
    pub in_flight: usize,
}

/// Fans eligible tenants out to `monitor-tenant` jobs. Never does work itself.
#[derive(Clone)]
pub struct Scheduler {
    tenants: Arc<dyn TenantSource>,
    queue: JobQueue<JobPayload>,
    interval: Duration,
    liveness: Arc<SchedulerLiveness>,
}

impl Scheduler {
    pub fn new(tenants: Arc<dyn TenantSource>, queue: JobQueue<JobPayload>, interval: Duration) -> Self {
        Self {
            tenants,
            queue,
            interval,
            liveness: Arc::new(SchedulerLiveness::default()),
        }
    }

    pub fn liveness(&self) -> Arc<SchedulerLiveness> {
        Arc::clone(&self.liveness)
    }

    /// Enqueues one monitoring job per eligible tenant whose poll interval
    /// has elapsed and that has nothing queued already.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> Result<CycleReport> {
        let tenants = self.tenants.list_eligible_tenants().await?;
        let mut report = CycleReport {
            eligible: tenants.len(),
            ..Default::default()
        };

        for tenant in tenants {
            if !tenant.is_eligible(now) {
                report.eligible -= 1;
                continue;
            }
            if !tenant.is_due(now) {
                report.not_due += 1;
                continue;
            }
            if self.queue.counts_for_tenant(&tenant.id).await.pending() > 0 {
                debug!(tenant_id = %tenant.id, "Tenant still has queued work, skipping");
                report.in_flight += 1;
                continue;
            }

            self.queue
                .enqueue(JobPayload::MonitorTenant(MonitorTenantJob {
                    tenant_id: tenant.id,
                    settings: tenant.settings,
                    credentials: tenant.credentials,
                    scheduled_at: now,
                }))
                .await?;
            report.enqueued += 1;
        }
        Ok(report)
    }

    /// Runs a cycle every interval until cancelled.
    ///
    /// Storage failures skip the cycle. A queue that can no longer accept
    /// jobs stops the loop with an error.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.liveness.set_running(true);
        info!(interval_secs = self.interval.as_secs(), "Scheduler started");

        let result = loop {
            tokio::select! {
                _ = cancel.cancelled() => break Ok(()),
                _ = ticker.tick() => {}
            }
            let now = Utc::now();
            self.liveness.tick(now);
            match self.run_cycle(now).await {
                Ok(report) => info!(
                    eligible = report.eligible,
                    enqueued = report.enqueued,
                    not_due = report.not_due,
                    in_flight = report.in_flight,
                    "Scheduler cycle finished"
                ),
                Err(e) if e.is_fatal() => {
                    error!(error = %e, "Job queue unavailable, stopping scheduler");
                    break Err(e);
                }
                Err(e) => error!(error = %e, "Scheduler cycle failed, skipping"),
            }
        };

        self.liveness.set_running(false);
        result
    }
}

/// Next instant at `hour`:00 UTC strictly after `now`.
pub fn next_daily_run(now: DateTime<Utc>, hour: u32) -> DateTime<Utc> {
    let at = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or(NaiveTime::MIN);
    let today = now.date_naive().and_time(at).and_utc();
    if today > now {
        today
    } else {
        today + chrono::Duration::days(1)
    }
}

/// Calls `job` every day at `hour` UTC until cancelled.
pub async fn run_daily<F, Fut>(name: &'static str, hour: u32, cancel: CancellationToken, mut job: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    loop {
        let now = Utc::now();
        let next = next_daily_run(now, hour);
        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
        info!(job = name, next_run = %next, "Daily job scheduled");
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(wait) => {}
        }
        job().await;
    }
}
