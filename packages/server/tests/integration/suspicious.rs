use ::common::comment::CommentRecord;
use ::common::social::{Comment, Post};
use ::common::{CommentStatus, Platform};
use chrono::Utc;

use crate::common::{TestApp, routes};

fn record(tenant_id: &str, id: &str, score: u8, status: CommentStatus) -> CommentRecord {
    let mut r = CommentRecord::discovered(
        tenant_id,
        Platform::Instagram,
        &Comment::new(id, "visit https://bit.ly/x"),
        &Post::new("p1"),
        Utc::now(),
    );
    r.analysis.suspicious_score = score;
    r.status = status;
    r
}

async fn seed(app: &TestApp) {
    for r in [
        record("t1", "low", 40, CommentStatus::Flagged),
        record("t1", "mid", 75, CommentStatus::Flagged),
        record("t1", "high", 95, CommentStatus::Pending),
        record("t1", "gone", 99, CommentStatus::Deleted),
        record("t2", "other", 90, CommentStatus::Flagged),
    ] {
        app.comments.put(r).await;
    }
}

fn ids(body: &serde_json::Value) -> Vec<&str> {
    body["comments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["comment_id"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn default_threshold_lists_reviewable_highest_first() {
    let app = TestApp::spawn().await;
    seed(&app).await;

    let res = app.get(&routes::suspicious("t1")).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["threshold"], 70);
    assert_eq!(res.body["count"], 2);
    assert_eq!(ids(&res.body), ["high", "mid"]);
    assert_eq!(res.body["comments"][0]["status"], "pending");
}

#[tokio::test]
async fn explicit_threshold_is_honored() {
    let app = TestApp::spawn().await;
    seed(&app).await;

    let res = app
        .get(&format!("{}?threshold=30", routes::suspicious("t1")))
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(ids(&res.body), ["high", "mid", "low"]);
}

#[tokio::test]
async fn unknown_tenant_yields_empty_list() {
    let app = TestApp::spawn().await;
    seed(&app).await;

    let res = app.get(&routes::suspicious("nobody")).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["count"], 0);
}

#[tokio::test]
async fn invalid_threshold_is_rejected() {
    let app = TestApp::spawn().await;

    for query in ["threshold=101", "threshold=high"] {
        let res = app
            .get(&format!("{}?{query}", routes::suspicious("t1")))
            .await;
        assert_eq!(res.status, 400, "{query}: {}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}
