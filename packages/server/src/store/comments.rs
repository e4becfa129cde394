use async_trait::async_trait;
use chrono::{Duration, Utc};
use common::comment::{ActionRecord, CommentKey, CommentRecord, ManualReview};
use common::storage::{CommentStore, InsertOutcome, StorageError};
use common::CommentStatus;
use sea_orm::*;

use super::backend;
use crate::entity::comment_record;

#[derive(Clone)]
pub struct SeaCommentStore {
    db: DatabaseConnection,
}

impl SeaCommentStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find(&self, key: &CommentKey) -> Result<Option<comment_record::Model>, StorageError> {
        comment_record::Entity::find_by_id((key.platform, key.comment_id.clone()))
            .one(&self.db)
            .await
            .map_err(backend)
    }
}

fn to_active_model(record: &CommentRecord) -> Result<comment_record::ActiveModel, StorageError> {
    Ok(comment_record::ActiveModel {
        platform: Set(record.platform),
        comment_id: Set(record.comment_id.clone()),
        tenant_id: Set(record.tenant_id.clone()),
        post_id: Set(record.post_id.clone()),
        post_type: Set(record.post_type.as_str().to_string()),
        post_url: Set(record.post_url.clone()),
        post_caption: Set(record.post_caption.clone()),
        text: Set(record.text.clone()),
        author_id: Set(record.author_id.clone()),
        author_username: Set(record.author_username.clone()),
        author_display_name: Set(record.author_display_name.clone()),
        is_reply: Set(record.is_reply),
        parent_comment_id: Set(record.parent_comment_id.clone()),
        like_count: Set(clamp_count(record.like_count)),
        reply_count: Set(clamp_count(record.reply_count)),
        comment_created_at: Set(record.comment_created_at),
        discovered_at: Set(record.discovered_at),
        processed_at: Set(record.processed_at),
        status: Set(record.status),
        suspicious_score: Set(i16::from(record.analysis.suspicious_score)),
        is_reviewed: Set(record.manual_review.is_reviewed),
        analysis: Set(serde_json::to_value(&record.analysis)?),
        action: Set(serde_json::to_value(&record.action)?),
        manual_review: Set(serde_json::to_value(&record.manual_review)?),
    })
}

fn clamp_count(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn from_model(model: comment_record::Model) -> Result<CommentRecord, StorageError> {
    let mut manual_review: ManualReview = serde_json::from_value(model.manual_review)?;
    manual_review.is_reviewed |= model.is_reviewed;

    Ok(CommentRecord {
        tenant_id: model.tenant_id,
        platform: model.platform,
        comment_id: model.comment_id,
        post_id: model.post_id,
        post_type: serde_json::from_value(serde_json::Value::String(model.post_type))?,
        post_url: model.post_url,
        post_caption: model.post_caption,
        text: model.text,
        author_id: model.author_id,
        author_username: model.author_username,
        author_display_name: model.author_display_name,
        is_reply: model.is_reply,
        parent_comment_id: model.parent_comment_id,
        like_count: u64::try_from(model.like_count).unwrap_or(0),
        reply_count: u64::try_from(model.reply_count).unwrap_or(0),
        comment_created_at: model.comment_created_at,
        discovered_at: model.discovered_at,
        processed_at: model.processed_at,
        status: model.status,
        analysis: serde_json::from_value(model.analysis)?,
        action: serde_json::from_value(model.action)?,
        manual_review,
    })
}

#[async_trait]
impl CommentStore for SeaCommentStore {
    async fn insert_if_absent(&self, record: &CommentRecord) -> Result<InsertOutcome, StorageError> {
        let model = to_active_model(record)?;
        match model.insert(&self.db).await {
            Ok(_) => Ok(InsertOutcome { inserted: true }),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(InsertOutcome { inserted: false })
            }
            Err(e) => Err(backend(e)),
        }
    }

    async fn exists(&self, key: &CommentKey) -> Result<bool, StorageError> {
        let count = comment_record::Entity::find()
            .filter(comment_record::Column::Platform.eq(key.platform))
            .filter(comment_record::Column::CommentId.eq(key.comment_id.as_str()))
            .count(&self.db)
            .await
            .map_err(backend)?;
        Ok(count > 0)
    }

    async fn get(&self, key: &CommentKey) -> Result<Option<CommentRecord>, StorageError> {
        self.find(key).await?.map(from_model).transpose()
    }

    async fn update_status(
        &self,
        key: &CommentKey,
        status: CommentStatus,
        action: &ActionRecord,
    ) -> Result<bool, StorageError> {
        let Some(model) = self.find(key).await? else {
            return Ok(false);
        };

        let mut active: comment_record::ActiveModel = model.into();
        active.status = Set(status);
        active.action = Set(serde_json::to_value(action)?);
        active.processed_at = Set(Some(Utc::now()));
        active.update(&self.db).await.map_err(backend)?;
        Ok(true)
    }

    async fn save_outcome(&self, record: &CommentRecord) -> Result<bool, StorageError> {
        let Some(model) = self.find(&record.key()).await? else {
            return Ok(false);
        };

        let mut active: comment_record::ActiveModel = model.into();
        active.status = Set(record.status);
        active.suspicious_score = Set(i16::from(record.analysis.suspicious_score));
        active.analysis = Set(serde_json::to_value(&record.analysis)?);
        active.action = Set(serde_json::to_value(&record.action)?);
        active.processed_at = Set(record.processed_at);
        active.update(&self.db).await.map_err(backend)?;
        Ok(true)
    }

    async fn find_suspicious(
        &self,
        tenant_id: &str,
        threshold: u8,
    ) -> Result<Vec<CommentRecord>, StorageError> {
        let models = comment_record::Entity::find()
            .filter(comment_record::Column::TenantId.eq(tenant_id))
            .filter(comment_record::Column::SuspiciousScore.gte(i16::from(threshold)))
            .filter(comment_record::Column::Status.is_in(CommentStatus::REVIEWABLE.iter().copied()))
            .order_by_desc(comment_record::Column::SuspiciousScore)
            .order_by_desc(comment_record::Column::DiscoveredAt)
            .all(&self.db)
            .await
            .map_err(backend)?;

        models.into_iter().map(from_model).collect()
    }

    async fn delete_older_than(
        &self,
        days: i64,
        statuses: &[CommentStatus],
    ) -> Result<u64, StorageError> {
        if statuses.is_empty() {
            return Ok(0);
        }
        let cutoff = Utc::now() - Duration::days(days);
        let result = comment_record::Entity::delete_many()
            .filter(comment_record::Column::DiscoveredAt.lt(cutoff))
            .filter(comment_record::Column::Status.is_in(statuses.iter().copied()))
            .filter(comment_record::Column::IsReviewed.eq(false))
            .exec(&self.db)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected)
    }
}
