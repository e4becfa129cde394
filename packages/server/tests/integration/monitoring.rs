use ::common::storage::TenantSource;

use crate::common::{TestApp, routes, tenant};

#[tokio::test]
async fn start_enables_and_status_reports_it() {
    let app = TestApp::spawn().await;
    app.tenants.insert(tenant("t1")).await;

    let res = app.post_empty(&routes::monitoring_start("t1")).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["tenant_id"], "t1");
    assert_eq!(res.body["is_enabled"], true);

    let res = app.get(&routes::monitoring_status("t1")).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["is_enabled"], true);
    assert_eq!(res.body["usage"]["bot_runs"], 0);
    assert!(res.body["last_run_at"].is_null());
    assert_eq!(res.body["jobs"]["waiting"], 0);
    assert_eq!(res.body["jobs"]["active"], 0);

    let stored = app.tenants.get_tenant("t1").await.unwrap().unwrap();
    assert!(stored.settings.is_enabled);
}

#[tokio::test]
async fn stop_disables_monitoring() {
    let app = TestApp::spawn().await;
    let mut t = tenant("t2");
    t.settings.is_enabled = true;
    app.tenants.insert(t).await;

    let res = app.post_empty(&routes::monitoring_stop("t2")).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["is_enabled"], false);
    assert_eq!(res.body["removed_jobs"], 0);
    let stored = app.tenants.get_tenant("t2").await.unwrap().unwrap();
    assert!(!stored.settings.is_enabled);
}

#[tokio::test]
async fn unknown_tenant_is_not_found() {
    let app = TestApp::spawn().await;

    for res in [
        app.post_empty(&routes::monitoring_start("ghost")).await,
        app.post_empty(&routes::monitoring_stop("ghost")).await,
        app.get(&routes::monitoring_status("ghost")).await,
    ] {
        assert_eq!(res.status, 404, "{}", res.text);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}
