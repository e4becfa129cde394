use ::common::Platform;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{TestApp, routes};

async fn mount_facebook_thread(app: &TestApp) {
    Mock::given(method("GET"))
        .and(path("/v18.0/post-1/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": "c1", "message": "top level", "from": {"id": "fan"}},
                {"id": "c2", "message": "dm me", "from": {"id": "bot"}, "parent": {"id": "c1"}},
                {"id": "c3", "message": "thanks!", "from": {"id": "page-1"}, "parent": {"id": "c1"}},
                {"id": "c4", "message": "cheap followers", "from": {"id": "bot"}, "parent": {"id": "c1"}}
            ]
        })))
        .mount(&app.graph)
        .await;
}

#[tokio::test]
async fn sweep_deletes_replies_but_keeps_owner() {
    let app = TestApp::spawn().await;
    mount_facebook_thread(&app).await;
    for id in ["c2", "c4"] {
        Mock::given(method("DELETE"))
            .and(path(format!("/v18.0/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&app.graph)
            .await;
    }

    let res = app
        .post(
            routes::SWEEP,
            &json!({
                "platform": Platform::Facebook,
                "parent_id": "post-1",
                "access_token": "page-token",
                "owner_account_id": "page-1"
            }),
        )
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["total"], 2);
    assert_eq!(res.body["deleted"], 2);
    assert_eq!(res.body["failed"], 0);
    assert_eq!(res.body["errors"], json!([]));
}

#[tokio::test]
async fn sweep_reports_failed_deletions() {
    let app = TestApp::spawn().await;
    mount_facebook_thread(&app).await;
    Mock::given(method("DELETE"))
        .and(path("/v18.0/c2"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&app.graph)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v18.0/c4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&app.graph)
        .await;

    let res = app
        .post(
            routes::SWEEP,
            &json!({
                "platform": "facebook",
                "parent_id": "post-1",
                "access_token": "page-token",
                "owner_account_id": "page-1"
            }),
        )
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["total"], 2);
    assert_eq!(res.body["deleted"], 1);
    assert_eq!(res.body["failed"], 1);
    assert_eq!(res.body["errors"][0]["comment_id"], "c2");
}

#[tokio::test]
async fn sweep_with_nothing_to_delete_returns_empty_summary() {
    let app = TestApp::spawn().await;
    Mock::given(method("GET"))
        .and(path("/v18.0/media-1/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "c1", "text": "love it", "user": {"id": "fan"}}]
        })))
        .mount(&app.graph)
        .await;

    let res = app
        .post(
            routes::SWEEP,
            &json!({"platform": "instagram", "parent_id": "media-1", "access_token": "tok"}),
        )
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["total"], 0);
    assert_eq!(res.body["deleted"], 0);
}

#[tokio::test]
async fn sweep_with_expired_token_is_unauthorized() {
    let app = TestApp::spawn().await;
    Mock::given(method("GET"))
        .and(path("/v18.0/post-1/comments"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"message": "Error validating access token", "type": "OAuthException", "code": 190}
        })))
        .mount(&app.graph)
        .await;

    let res = app
        .post(
            routes::SWEEP,
            &json!({"platform": "facebook", "parent_id": "post-1", "access_token": "stale"}),
        )
        .await;

    assert_eq!(res.status, 401, "{}", res.text);
    assert_eq!(res.body["code"], "TOKEN_INVALID");
}

#[tokio::test]
async fn sweep_rejects_malformed_requests() {
    let app = TestApp::spawn().await;

    let res = app.post_raw(routes::SWEEP, "{not json").await;
    assert_eq!(res.status, 400, "{}", res.text);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");

    let res = app
        .post(
            routes::SWEEP,
            &json!({"platform": "tiktok", "parent_id": "x", "access_token": "tok"}),
        )
        .await;
    assert_eq!(res.status, 400, "{}", res.text);

    let res = app
        .post(
            routes::SWEEP,
            &json!({"platform": "facebook", "parent_id": "  ", "access_token": "tok"}),
        )
        .await;
    assert_eq!(res.status, 400, "{}", res.text);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}
