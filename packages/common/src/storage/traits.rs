use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::StorageError;
use crate::comment::{ActionRecord, CommentKey, CommentRecord};
use crate::comment_status::CommentStatus;
use crate::tenant::Tenant;

/// Result of an insert-if-absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertOutcome {
    pub inserted: bool,
}

/// Idempotency ledger and audit trail of comments, keyed by (platform, comment id).
#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Insert `record` unless a record with the same key exists.
    ///
    /// Must be atomic: of several concurrent calls for one key, exactly one
    /// reports `inserted = true`.
    async fn insert_if_absent(&self, record: &CommentRecord) -> Result<InsertOutcome, StorageError>;

    async fn exists(&self, key: &CommentKey) -> Result<bool, StorageError>;

    async fn get(&self, key: &CommentKey) -> Result<Option<CommentRecord>, StorageError>;

    /// Set the status and action of a record and stamp `processed_at`.
    ///
    /// Returns `false` if no record exists for `key`.
    async fn update_status(
        &self,
        key: &CommentKey,
        status: CommentStatus,
        action: &ActionRecord,
    ) -> Result<bool, StorageError>;

    /// Persist analysis, status, action and `processed_at` of a processed record.
    async fn save_outcome(&self, record: &CommentRecord) -> Result<bool, StorageError>;

    /// Pending or flagged records of a tenant scoring at least `threshold`,
    /// highest score first.
    async fn find_suspicious(
        &self,
        tenant_id: &str,
        threshold: u8,
    ) -> Result<Vec<CommentRecord>, StorageError>;

    /// Delete records discovered more than `days` ago whose status is in
    /// `statuses`. Manually reviewed records are always kept.
    async fn delete_older_than(
        &self,
        days: i64,
        statuses: &[CommentStatus],
    ) -> Result<u64, StorageError>;
}

/// Tenant configuration. Read-only apart from usage counters, the enabled
/// flag and credential pruning.
#[async_trait]
pub trait TenantSource: Send + Sync {
    /// Tenants with monitoring enabled, a live entitlement and at least one
    /// monitorable platform.
    async fn list_eligible_tenants(&self) -> Result<Vec<Tenant>, StorageError>;

    async fn get_tenant(&self, id: &str) -> Result<Option<Tenant>, StorageError>;

    /// Add to the usage counters and stamp `started_at` as the last run.
    async fn update_usage(
        &self,
        id: &str,
        processed: u64,
        deleted: u64,
        posts_scanned: u64,
        started_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    async fn set_monitoring_enabled(&self, id: &str, enabled: bool) -> Result<(), StorageError>;

    /// Remove expired refresh entries from every tenant; returns how many were removed.
    async fn prune_expired_refresh_tokens(&self) -> Result<u64, StorageError>;
}
