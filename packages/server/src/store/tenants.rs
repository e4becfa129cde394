use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::storage::{StorageError, TenantSource};
use common::tenant::{TenantCredentials, TenantSettings, UsageStats};
use common::Tenant;
use sea_orm::sea_query::{LockType, OnConflict};
use sea_orm::*;
use tracing::debug;

use super::backend;
use crate::entity::tenant;

#[derive(Clone)]
pub struct SeaTenantSource {
    db: DatabaseConnection,
}

impl SeaTenantSource {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert a tenant or replace its documents. Provisioning lives outside
    /// the pipeline; this is used to seed tenants.
    pub async fn upsert(&self, tenant: &Tenant) -> Result<(), StorageError> {
        let now = Utc::now();
        let model = tenant::ActiveModel {
            id: Set(tenant.id.clone()),
            settings: Set(serde_json::to_value(&tenant.settings)?),
            credentials: Set(serde_json::to_value(&tenant.credentials)?),
            usage: Set(serde_json::to_value(&tenant.usage)?),
            is_enabled: Set(tenant.settings.is_enabled),
            entitlement_expires_at: Set(tenant.entitlement_expires_at),
            created_at: Set(now),
            updated_at: Set(now),
        };

        tenant::Entity::insert(model)
            .on_conflict(
                OnConflict::column(tenant::Column::Id)
                    .update_columns([
                        tenant::Column::Settings,
                        tenant::Column::Credentials,
                        tenant::Column::Usage,
                        tenant::Column::IsEnabled,
                        tenant::Column::EntitlementExpiresAt,
                        tenant::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(backend)?;
        Ok(())
    }
}

fn from_model(model: tenant::Model) -> Result<Tenant, StorageError> {
    let mut settings: TenantSettings = serde_json::from_value(model.settings)?;
    settings.is_enabled = model.is_enabled;
    let credentials: TenantCredentials = serde_json::from_value(model.credentials)?;
    let usage: UsageStats = serde_json::from_value(model.usage)?;

    Ok(Tenant {
        id: model.id,
        settings,
        credentials,
        usage,
        entitlement_expires_at: model.entitlement_expires_at,
    })
}

fn not_found(id: &str) -> StorageError {
    StorageError::NotFound(format!("tenant {id}"))
}

#[async_trait]
impl TenantSource for SeaTenantSource {
    async fn list_eligible_tenants(&self) -> Result<Vec<Tenant>, StorageError> {
        let now = Utc::now();
        let models = tenant::Entity::find()
            .filter(tenant::Column::IsEnabled.eq(true))
            .filter(tenant::Column::EntitlementExpiresAt.gt(now))
            .order_by_asc(tenant::Column::Id)
            .all(&self.db)
            .await
            .map_err(backend)?;

        let mut eligible = Vec::with_capacity(models.len());
        for model in models {
            let tenant = from_model(model)?;
            if tenant.is_eligible(now) {
                eligible.push(tenant);
            }
        }
        Ok(eligible)
    }

    async fn get_tenant(&self, id: &str) -> Result<Option<Tenant>, StorageError> {
        tenant::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(backend)?
            .map(from_model)
            .transpose()
    }

    async fn update_usage(
        &self,
        id: &str,
        processed: u64,
        deleted: u64,
        posts_scanned: u64,
        started_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let txn = self.db.begin().await.map_err(backend)?;

        let model = tenant::Entity::find_by_id(id)
            .lock(LockType::Update)
            .one(&txn)
            .await
            .map_err(backend)?
            .ok_or_else(|| not_found(id))?;

        let mut usage: UsageStats = serde_json::from_value(model.usage.clone())?;
        usage.record_run(processed, deleted, posts_scanned, started_at);

        let mut active: tenant::ActiveModel = model.into();
        active.usage = Set(serde_json::to_value(&usage)?);
        active.updated_at = Set(Utc::now());
        active.update(&txn).await.map_err(backend)?;

        txn.commit().await.map_err(backend)
    }

    async fn set_monitoring_enabled(&self, id: &str, enabled: bool) -> Result<(), StorageError> {
        let model = tenant::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(backend)?
            .ok_or_else(|| not_found(id))?;

        let mut settings: TenantSettings = serde_json::from_value(model.settings.clone())?;
        settings.is_enabled = enabled;

        let mut active: tenant::ActiveModel = model.into();
        active.settings = Set(serde_json::to_value(&settings)?);
        active.is_enabled = Set(enabled);
        active.updated_at = Set(Utc::now());
        active.update(&self.db).await.map_err(backend)?;
        Ok(())
    }

    async fn prune_expired_refresh_tokens(&self) -> Result<u64, StorageError> {
        let now = Utc::now();
        let models = tenant::Entity::find()
            .all(&self.db)
            .await
            .map_err(backend)?;

        let mut removed = 0u64;
        for model in models {
            let mut credentials: TenantCredentials =
                serde_json::from_value(model.credentials.clone())?;
            let pruned = credentials.prune_expired_refresh_tokens(now);
            if pruned == 0 {
                continue;
            }
            debug!(tenant_id = %model.id, pruned, "Pruned expired refresh tokens");

            let mut active: tenant::ActiveModel = model.into();
            active.credentials = Set(serde_json::to_value(&credentials)?);
            active.updated_at = Set(now);
            active.update(&self.db).await.map_err(backend)?;
            removed += pruned as u64;
        }
        Ok(removed)
    }
}
