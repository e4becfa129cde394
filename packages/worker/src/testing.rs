//! Scripted collaborators for worker tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use api_client::{ApiError, LongLivedToken, PlatformApi, TokenValidation};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use common::comment::{ActionRecord, CommentKey, CommentRecord};
use common::comment_status::CommentStatus;
use common::event::GenericEvent;
use common::platform::Platform;
use common::social::{Comment, Post};
use common::storage::memory::{MemoryCommentStore, MemoryTenantSource};
use common::storage::{CommentStore, InsertOutcome, StorageError};
use common::tenant::{Tenant, TenantSettings};
use tokio::time::Instant;

use crate::analysis::{AnalysisPolicy, AnalysisVerdict};
use crate::notify::NotificationSink;
use crate::pipeline::PipelineDeps;

#[derive(Default)]
pub struct FakeApi {
    posts: Mutex<HashMap<Platform, Vec<Post>>>,
    comments: Mutex<HashMap<String, Vec<Comment>>>,
    failing_posts: Mutex<HashMap<Platform, ApiError>>,
    failing_deletes: Mutex<HashMap<String, ApiError>>,
    deletes: Mutex<Vec<(String, Instant)>>,
    gone: Mutex<HashSet<String>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_posts(self, platform: Platform, posts: Vec<Post>) -> Self {
        self.posts.lock().unwrap().insert(platform, posts);
        self
    }

    pub fn with_comments(self, post_id: &str, comments: Vec<Comment>) -> Self {
        self.comments.lock().unwrap().insert(post_id.to_string(), comments);
        self
    }

    pub fn failing_posts(self, platform: Platform, err: ApiError) -> Self {
        self.failing_posts.lock().unwrap().insert(platform, err);
        self
    }

    pub fn failing_delete(self, comment_id: &str, err: ApiError) -> Self {
        self.failing_deletes
            .lock()
            .unwrap()
            .insert(comment_id.to_string(), err);
        self
    }

    /// Ids passed to `delete_comment`, including failed attempts, in call order.
    pub fn delete_calls(&self) -> Vec<String> {
        self.deletes.lock().unwrap().iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn delete_times(&self) -> Vec<Instant> {
        self.deletes.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }
}

pub fn server_error() -> ApiError {
    ApiError::Server {
        status: 500,
        message: "boom".into(),
    }
}

#[async_trait]
impl PlatformApi for FakeApi {
    async fn list_recent_posts(
        &self,
        platform: Platform,
        _account_id: &str,
        _access_token: &str,
        limit: u32,
    ) -> Result<Vec<Post>, ApiError> {
        if let Some(err) = self.failing_posts.lock().unwrap().get(&platform) {
            return Err(err.clone());
        }
        let posts = self.posts.lock().unwrap().get(&platform).cloned().unwrap_or_default();
        Ok(posts.into_iter().take(limit as usize).collect())
    }

    async fn list_comments(
        &self,
        _platform: Platform,
        post_id: &str,
        _access_token: &str,
        limit: u32,
    ) -> Result<Vec<Comment>, ApiError> {
        let comments = self.comments.lock().unwrap().get(post_id).cloned().unwrap_or_default();
        Ok(comments.into_iter().take(limit as usize).collect())
    }

    async fn delete_comment(
        &self,
        _platform: Platform,
        comment_id: &str,
        _access_token: &str,
    ) -> Result<(), ApiError> {
        self.deletes
            .lock()
            .unwrap()
            .push((comment_id.to_string(), Instant::now()));
        if let Some(err) = self.failing_deletes.lock().unwrap().get(comment_id) {
            return Err(err.clone());
        }
        // Like the Graph API, a second delete of the same object fails.
        if !self.gone.lock().unwrap().insert(comment_id.to_string()) {
            return Err(ApiError::NotFound {
                status: 400,
                message: format!("Object with ID '{comment_id}' does not exist"),
            });
        }
        Ok(())
    }

    async fn hide_comment(
        &self,
        _platform: Platform,
        _comment_id: &str,
        _access_token: &str,
        _hidden: bool,
    ) -> Result<(), ApiError> {
        Ok(())
    }

    async fn exchange_token(&self, short_lived_token: &str) -> Result<LongLivedToken, ApiError> {
        Ok(LongLivedToken {
            access_token: format!("long-{short_lived_token}"),
            token_type: Some("bearer".into()),
            expires_in: Some(3600),
        })
    }

    async fn validate_token(&self, _access_token: &str) -> TokenValidation {
        TokenValidation {
            valid: true,
            account_id: None,
            name: None,
            error: None,
        }
    }
}

/// Returns the same verdict for every comment.
pub struct FixedPolicy(pub AnalysisVerdict);

impl FixedPolicy {
    pub fn unauthorized(score: u8) -> Self {
        Self(AnalysisVerdict {
            is_authorized: false,
            suspicious_score: score,
            flags: Vec::new(),
            detected_keywords: Vec::new(),
        })
    }

    pub fn authorized(score: u8) -> Self {
        Self(AnalysisVerdict {
            is_authorized: true,
            ..Self::unauthorized(score).0
        })
    }
}

#[async_trait]
impl AnalysisPolicy for FixedPolicy {
    async fn analyze(&self, _record: &CommentRecord, _settings: &TenantSettings) -> AnalysisVerdict {
        self.0.clone()
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<(String, GenericEvent)>>,
}

impl RecordingSink {
    pub fn topics(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(_, e)| e.topic.clone())
            .collect()
    }
}

impl NotificationSink for RecordingSink {
    fn emit(&self, tenant_id: &str, event: GenericEvent) {
        self.events
            .lock()
            .unwrap()
            .push((tenant_id.to_string(), event));
    }
}

/// Memory store whose `save_outcome` fails a set number of times.
pub struct FlakyCommentStore {
    pub inner: Arc<MemoryCommentStore>,
    failing_saves: AtomicU32,
}

impl FlakyCommentStore {
    pub fn new(inner: Arc<MemoryCommentStore>, failing_saves: u32) -> Self {
        Self {
            inner,
            failing_saves: AtomicU32::new(failing_saves),
        }
    }
}

#[async_trait]
impl CommentStore for FlakyCommentStore {
    async fn insert_if_absent(&self, record: &CommentRecord) -> Result<InsertOutcome, StorageError> {
        self.inner.insert_if_absent(record).await
    }

    async fn exists(&self, key: &CommentKey) -> Result<bool, StorageError> {
        self.inner.exists(key).await
    }

    async fn get(&self, key: &CommentKey) -> Result<Option<CommentRecord>, StorageError> {
        self.inner.get(key).await
    }

    async fn update_status(
        &self,
        key: &CommentKey,
        status: CommentStatus,
        action: &ActionRecord,
    ) -> Result<bool, StorageError> {
        self.inner.update_status(key, status, action).await
    }

    async fn save_outcome(&self, record: &CommentRecord) -> Result<bool, StorageError> {
        let remaining = self
            .failing_saves
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if remaining.is_ok() {
            return Err(StorageError::Backend("connection reset".into()));
        }
        self.inner.save_outcome(record).await
    }

    async fn find_suspicious(
        &self,
        tenant_id: &str,
        threshold: u8,
    ) -> Result<Vec<CommentRecord>, StorageError> {
        self.inner.find_suspicious(tenant_id, threshold).await
    }

    async fn delete_older_than(
        &self,
        days: i64,
        statuses: &[CommentStatus],
    ) -> Result<u64, StorageError> {
        self.inner.delete_older_than(days, statuses).await
    }
}

pub struct Harness {
    pub api: Arc<FakeApi>,
    pub comments: Arc<MemoryCommentStore>,
    pub tenants: Arc<MemoryTenantSource>,
    pub sink: Arc<RecordingSink>,
}

impl Harness {
    pub fn new(api: FakeApi) -> Self {
        Self {
            api: Arc::new(api),
            comments: Arc::new(MemoryCommentStore::new()),
            tenants: Arc::new(MemoryTenantSource::new()),
            sink: Arc::new(RecordingSink::default()),
        }
    }

    pub fn deps(&self, policy: impl AnalysisPolicy + 'static) -> PipelineDeps {
        PipelineDeps {
            api: self.api.clone(),
            comments: self.comments.clone(),
            tenants: self.tenants.clone(),
            policy: Arc::new(policy),
            notifier: self.sink.clone(),
        }
    }
}

/// Enabled tenant with live entitlement and credentials on both platforms.
pub fn active_tenant(id: &str) -> Tenant {
    let mut tenant = Tenant::new(id);
    tenant.settings.is_enabled = true;
    tenant.entitlement_expires_at = Some(Utc::now() + Duration::days(30));
    tenant.credentials.instagram_access_token = Some("ig-token".into());
    tenant.credentials.instagram_business_account_id = Some("ig-owner".into());
    tenant.credentials.facebook_access_token = Some("fb-token".into());
    tenant.credentials.facebook_page_id = Some("fb-owner".into());
    tenant
}
