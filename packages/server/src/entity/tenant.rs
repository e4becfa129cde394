use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tenant")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// `TenantSettings` document.
    #[sea_orm(column_type = "JsonBinary")]
    pub settings: Json,
    /// `TenantCredentials` document. Never returned by the API.
    #[sea_orm(column_type = "JsonBinary")]
    pub credentials: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub usage: Json,

    /// Denormalized `settings.is_enabled` for the scheduler query.
    #[sea_orm(default_value = false, indexed)]
    pub is_enabled: bool,
    pub entitlement_expires_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
