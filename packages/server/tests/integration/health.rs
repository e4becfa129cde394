use crate::common::{TestApp, routes};

#[tokio::test]
async fn health_reports_every_queue() {
    let app = TestApp::spawn().await;

    let res = app.get(routes::HEALTH).await;

    assert_eq!(res.status, 200, "{}", res.text);
    // The scheduler loop is not spawned by the test app.
    assert_eq!(res.body["status"], "degraded");
    assert_eq!(res.body["scheduler_running"], false);
    assert_eq!(res.body["queue_closed"], false);

    let mut names: Vec<&str> = res.body["queues"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["name"].as_str().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, ["batch-delete", "monitor-tenant", "process-comment"]);
    assert_eq!(res.body["queues"][0]["counts"]["waiting"], 0);
}
