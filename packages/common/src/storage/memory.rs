//! In-memory stores, used by tests and by single-process deployments without a database.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use super::error::StorageError;
use super::traits::{CommentStore, InsertOutcome, TenantSource};
use crate::comment::{ActionRecord, CommentKey, CommentRecord};
use crate::comment_status::CommentStatus;
use crate::tenant::Tenant;

#[derive(Debug, Default)]
pub struct MemoryCommentStore {
    records: RwLock<HashMap<CommentKey, CommentRecord>>,
}

impl MemoryCommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Insert or replace a record unconditionally.
    pub async fn put(&self, record: CommentRecord) {
        self.records.write().await.insert(record.key(), record);
    }
}

#[async_trait]
impl CommentStore for MemoryCommentStore {
    async fn insert_if_absent(&self, record: &CommentRecord) -> Result<InsertOutcome, StorageError> {
        let mut records = self.records.write().await;
        match records.entry(record.key()) {
            Entry::Occupied(_) => Ok(InsertOutcome { inserted: false }),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(InsertOutcome { inserted: true })
            }
        }
    }

    async fn exists(&self, key: &CommentKey) -> Result<bool, StorageError> {
        Ok(self.records.read().await.contains_key(key))
    }

    async fn get(&self, key: &CommentKey) -> Result<Option<CommentRecord>, StorageError> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn update_status(
        &self,
        key: &CommentKey,
        status: CommentStatus,
        action: &ActionRecord,
    ) -> Result<bool, StorageError> {
        let mut records = self.records.write().await;
        let Some(record) = records.get_mut(key) else {
            return Ok(false);
        };
        record.status = status;
        record.action = action.clone();
        record.processed_at = Some(Utc::now());
        Ok(true)
    }

    async fn save_outcome(&self, outcome: &CommentRecord) -> Result<bool, StorageError> {
        let mut records = self.records.write().await;
        let Some(record) = records.get_mut(&outcome.key()) else {
            return Ok(false);
        };
        record.status = outcome.status;
        record.analysis = outcome.analysis.clone();
        record.action = outcome.action.clone();
        record.processed_at = outcome.processed_at;
        Ok(true)
    }

    async fn find_suspicious(
        &self,
        tenant_id: &str,
        threshold: u8,
    ) -> Result<Vec<CommentRecord>, StorageError> {
        let records = self.records.read().await;
        let mut found: Vec<CommentRecord> = records
            .values()
            .filter(|r| {
                r.tenant_id == tenant_id
                    && r.analysis.suspicious_score >= threshold
                    && CommentStatus::REVIEWABLE.contains(&r.status)
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| b.analysis.suspicious_score.cmp(&a.analysis.suspicious_score));
        Ok(found)
    }

    async fn delete_older_than(
        &self,
        days: i64,
        statuses: &[CommentStatus],
    ) -> Result<u64, StorageError> {
        let cutoff = Utc::now() - Duration::days(days);
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| {
            let purge = r.discovered_at < cutoff
                && statuses.contains(&r.status)
                && !r.manual_review.is_reviewed;
            !purge
        });
        Ok((before - records.len()) as u64)
    }
}

#[derive(Debug, Default)]
pub struct MemoryTenantSource {
    tenants: RwLock<HashMap<String, Tenant>>,
}

impl MemoryTenantSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, tenant: Tenant) {
        self.tenants.write().await.insert(tenant.id.clone(), tenant);
    }
}

#[async_trait]
impl TenantSource for MemoryTenantSource {
    async fn list_eligible_tenants(&self) -> Result<Vec<Tenant>, StorageError> {
        let now = Utc::now();
        let tenants = self.tenants.read().await;
        let mut eligible: Vec<Tenant> = tenants
            .values()
            .filter(|t| t.is_eligible(now))
            .cloned()
            .collect();
        eligible.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(eligible)
    }

    async fn get_tenant(&self, id: &str) -> Result<Option<Tenant>, StorageError> {
        Ok(self.tenants.read().await.get(id).cloned())
    }

    async fn update_usage(
        &self,
        id: &str,
        processed: u64,
        deleted: u64,
        posts_scanned: u64,
        started_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut tenants = self.tenants.write().await;
        let tenant = tenants
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound(format!("tenant {id}")))?;
        tenant
            .usage
            .record_run(processed, deleted, posts_scanned, started_at);
        Ok(())
    }

    async fn set_monitoring_enabled(&self, id: &str, enabled: bool) -> Result<(), StorageError> {
        let mut tenants = self.tenants.write().await;
        let tenant = tenants
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound(format!("tenant {id}")))?;
        tenant.settings.is_enabled = enabled;
        Ok(())
    }

    async fn prune_expired_refresh_tokens(&self) -> Result<u64, StorageError> {
        let now = Utc::now();
        let mut tenants = self.tenants.write().await;
        let removed: u64 = tenants
            .values_mut()
            .map(|t| t.credentials.prune_expired_refresh_tokens(now) as u64)
            .sum();
        Ok(removed)
    }
}
