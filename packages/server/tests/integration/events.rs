use std::time::Duration;

use ::common::event::GenericEvent;
use serde_json::json;
use worker::NotificationSink;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn event_stream_delivers_only_the_tenants_notifications() {
    let app = TestApp::spawn().await;
    let mut res = app.open_stream(&routes::events("t1")).await;

    assert_eq!(res.status().as_u16(), 200);
    assert!(
        res.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream")
    );

    app.events.emit(
        "t2",
        GenericEvent {
            topic: "deletion-summary".into(),
            payload: json!({ "deleted": 9 }),
        },
    );
    app.events.emit(
        "t1",
        GenericEvent {
            topic: "deletion-summary".into(),
            payload: json!({ "deleted": 2 }),
        },
    );

    let chunk = tokio::time::timeout(Duration::from_secs(5), res.chunk())
        .await
        .expect("No event within 5s")
        .unwrap()
        .expect("Stream ended");
    let text = String::from_utf8_lossy(&chunk);

    assert!(text.contains("event: deletion-summary"), "{text}");
    assert!(text.contains(r#"data: {"deleted":2}"#), "{text}");
    assert!(!text.contains("9"), "{text}");
}
