use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::job::JobPayload;
use common::storage::TenantSource;
use common::tenant::{Tenant, UsageStats};
use mq::{JobCounts, JobQueue};
use serde::Serialize;
use tracing::info;

use crate::error::{Result, WorkerError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitoringStatus {
    pub tenant_id: String,
    pub is_enabled: bool,
    pub last_run_at: Option<DateTime<Utc>>,
    pub usage: UsageStats,
    pub jobs: JobCounts,
}

/// Per-tenant start, stop and status of monitoring.
#[derive(Clone)]
pub struct MonitoringControl {
    tenants: Arc<dyn TenantSource>,
    queue: JobQueue<JobPayload>,
}

impl MonitoringControl {
    pub fn new(tenants: Arc<dyn TenantSource>, queue: JobQueue<JobPayload>) -> Self {
        Self { tenants, queue }
    }

    async fn tenant(&self, tenant_id: &str) -> Result<Tenant> {
        self.tenants
            .get_tenant(tenant_id)
            .await?
            .ok_or_else(|| WorkerError::TenantNotFound(tenant_id.to_string()))
    }

    pub async fn start(&self, tenant_id: &str) -> Result<MonitoringStatus> {
        self.tenant(tenant_id).await?;
        self.tenants.set_monitoring_enabled(tenant_id, true).await?;
        info!(tenant_id, "Monitoring started");
        self.status(tenant_id).await
    }

    /// Disables monitoring and drops the tenant's queued jobs. Jobs already
    /// running finish normally. Returns the number of jobs removed.
    pub async fn stop(&self, tenant_id: &str) -> Result<usize> {
        self.tenant(tenant_id).await?;
        self.tenants.set_monitoring_enabled(tenant_id, false).await?;
        let removed = self.queue.remove_pending_for_tenant(tenant_id).await;
        info!(tenant_id, removed, "Monitoring stopped");
        Ok(removed)
    }

    pub async fn status(&self, tenant_id: &str) -> Result<MonitoringStatus> {
        let tenant = self.tenant(tenant_id).await?;
        Ok(MonitoringStatus {
            is_enabled: tenant.settings.is_enabled,
            last_run_at: tenant.usage.last_run_at,
            jobs: self.queue.counts_for_tenant(&tenant.id).await,
            usage: tenant.usage,
            tenant_id: tenant.id,
        })
    }
}
