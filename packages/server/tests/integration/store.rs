//! Postgres-backed stores. Run with `--ignored` on a host with Docker.

use std::sync::Arc;

use ::common::comment::{ActionRecord, ActionType, CommentKey, CommentRecord};
use ::common::social::{Comment, Post};
use ::common::storage::{CommentStore, TenantSource};
use ::common::tenant::RefreshToken;
use ::common::{CommentStatus, Platform};
use chrono::{Duration, Utc};
use server::store::{SeaCommentStore, SeaTenantSource};

use crate::common::postgres::fresh_db;
use crate::common::tenant;

fn record(id: &str, days_old: i64) -> CommentRecord {
    let now = Utc::now();
    let mut comment = Comment::new(id, "check @shop at https://bit.ly/x #deal").with_author("u1");
    comment.like_count = 3;
    let mut r = CommentRecord::discovered("t1", Platform::Instagram, &comment, &Post::new("p1"), now);
    r.discovered_at = now - Duration::days(days_old);
    r
}

#[tokio::test]
#[ignore = "needs a Docker daemon for PostgreSQL"]
async fn insert_if_absent_admits_one_of_concurrent_duplicates() {
    let store = Arc::new(SeaCommentStore::new(fresh_db().await));
    let rec = record("c1", 0);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        let rec = rec.clone();
        handles.push(tokio::spawn(async move {
            store.insert_if_absent(&rec).await.unwrap().inserted
        }));
    }
    let mut inserted = 0;
    for h in handles {
        if h.await.unwrap() {
            inserted += 1;
        }
    }
    assert_eq!(inserted, 1);

    let stored = store.get(&rec.key()).await.unwrap().unwrap();
    assert_eq!(stored.text, rec.text);
    assert_eq!(stored.like_count, 3);
    assert_eq!(stored.analysis.detected_hashtags, ["deal"]);
    assert_eq!(stored.status, CommentStatus::Pending);
}

#[tokio::test]
#[ignore = "needs a Docker daemon for PostgreSQL"]
async fn update_status_and_suspicious_listing() {
    let store = SeaCommentStore::new(fresh_db().await);
    for (id, score) in [("a", 72u8), ("b", 95), ("c", 40)] {
        let mut r = record(id, 0);
        r.analysis.suspicious_score = score;
        store.insert_if_absent(&r).await.unwrap();
    }

    let key = CommentKey::new(Platform::Instagram, "b");
    let action = ActionRecord::failed(ActionType::Delete, "HTTP 500", Utc::now());
    assert!(store.update_status(&key, CommentStatus::Flagged, &action).await.unwrap());
    assert!(
        !store
            .update_status(&CommentKey::new(Platform::Facebook, "b"), CommentStatus::Deleted, &action)
            .await
            .unwrap()
    );

    let updated = store.get(&key).await.unwrap().unwrap();
    assert_eq!(updated.status, CommentStatus::Flagged);
    assert_eq!(updated.action.error.as_deref(), Some("HTTP 500"));
    assert!(updated.processed_at.is_some());

    let found = store.find_suspicious("t1", 70).await.unwrap();
    let ids: Vec<_> = found.iter().map(|r| r.comment_id.as_str()).collect();
    assert_eq!(ids, ["b", "a"]);
}

#[tokio::test]
#[ignore = "needs a Docker daemon for PostgreSQL"]
async fn delete_older_than_keeps_reviewed_and_flagged() {
    let store = SeaCommentStore::new(fresh_db().await);

    let mut old = record("old", 120);
    old.status = CommentStatus::Processed;
    let mut reviewed = record("reviewed", 120);
    reviewed.status = CommentStatus::Deleted;
    reviewed.manual_review.is_reviewed = true;
    let mut flagged = record("flagged", 120);
    flagged.status = CommentStatus::Flagged;
    let mut recent = record("recent", 5);
    recent.status = CommentStatus::Processed;
    for r in [&old, &reviewed, &flagged, &recent] {
        store.insert_if_absent(r).await.unwrap();
    }

    let removed = store
        .delete_older_than(90, CommentStatus::PURGEABLE)
        .await
        .unwrap();

    assert_eq!(removed, 1);
    assert!(!store.exists(&old.key()).await.unwrap());
    assert!(store.exists(&reviewed.key()).await.unwrap());
    assert!(store.exists(&flagged.key()).await.unwrap());
}

#[tokio::test]
#[ignore = "needs a Docker daemon for PostgreSQL"]
async fn tenant_source_roundtrip() {
    let source = SeaTenantSource::new(fresh_db().await);
    let now = Utc::now();

    let mut enabled = tenant("t1");
    enabled.settings.is_enabled = true;
    enabled.credentials.refresh_tokens = vec![
        RefreshToken { token: "old".into(), expires_at: now - Duration::days(1) },
        RefreshToken { token: "new".into(), expires_at: now + Duration::days(1) },
    ];
    source.upsert(&enabled).await.unwrap();
    source.upsert(&tenant("t2")).await.unwrap();

    let eligible = source.list_eligible_tenants().await.unwrap();
    assert_eq!(eligible.len(), 1);
    assert_eq!(eligible[0].id, "t1");

    source.update_usage("t1", 5, 2, 10, now).await.unwrap();
    source.update_usage("t1", 1, 0, 10, now).await.unwrap();
    let t1 = source.get_tenant("t1").await.unwrap().unwrap();
    assert_eq!(t1.usage.comments_processed, 6);
    assert_eq!(t1.usage.comments_deleted, 2);
    assert_eq!(t1.usage.bot_runs, 2);
    assert_eq!(
        t1.usage.last_run_at.map(|t| t.timestamp_millis()),
        Some(now.timestamp_millis())
    );

    source.set_monitoring_enabled("t2", true).await.unwrap();
    assert_eq!(source.list_eligible_tenants().await.unwrap().len(), 2);
    assert!(source.set_monitoring_enabled("ghost", true).await.is_err());

    assert_eq!(source.prune_expired_refresh_tokens().await.unwrap(), 1);
    let t1 = source.get_tenant("t1").await.unwrap().unwrap();
    assert_eq!(t1.credentials.refresh_tokens.len(), 1);
}
