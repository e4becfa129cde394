use std::net::SocketAddr;
use std::sync::Arc;

use api_client::{ApiClientConfig, MetaClient};
use chrono::{Duration, Utc};
use reqwest::Client;
use serde_json::Value;
use wiremock::MockServer;

use ::common::config::PipelineConfig;
use ::common::storage::memory::{MemoryCommentStore, MemoryTenantSource};
use ::common::tenant::Tenant;
use server::config::CorsConfig;
use server::state::AppState;
use worker::{BroadcastSink, KeywordPolicy, Pipeline, PipelineDeps};

pub mod postgres;

pub mod routes {
    pub const HEALTH: &str = "/health";
    pub const SWEEP: &str = "/api/v1/moderation/sweep";

    pub fn monitoring_start(tenant_id: &str) -> String {
        format!("/api/v1/monitoring/{tenant_id}/start")
    }

    pub fn monitoring_stop(tenant_id: &str) -> String {
        format!("/api/v1/monitoring/{tenant_id}/stop")
    }

    pub fn monitoring_status(tenant_id: &str) -> String {
        format!("/api/v1/monitoring/{tenant_id}/status")
    }

    pub fn suspicious(tenant_id: &str) -> String {
        format!("/api/v1/tenants/{tenant_id}/suspicious")
    }

    pub fn events(tenant_id: &str) -> String {
        format!("/api/v1/tenants/{tenant_id}/events")
    }
}

/// A running test server backed by in-memory stores, with a mock Graph API.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub graph: MockServer,
    pub comments: Arc<MemoryCommentStore>,
    pub tenants: Arc<MemoryTenantSource>,
    pub events: BroadcastSink,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestResponse {
    async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.expect("Failed to read response body");
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        let graph = MockServer::start().await;
        let api = MetaClient::new(ApiClientConfig {
            base_url: graph.uri(),
            rate_limit_delay_ms: 0,
            max_retries: 0,
            retry_delay_ms: 10,
            ..Default::default()
        })
        .expect("Failed to build Graph API client");

        let comments = Arc::new(MemoryCommentStore::new());
        let tenants = Arc::new(MemoryTenantSource::new());
        let events = BroadcastSink::new(64);

        let mut config = PipelineConfig::default();
        config.processing.batch_delete_delay_ms = 0;
        config.queue.backoff_base_ms = 10;

        let pipeline = Pipeline::start(
            PipelineDeps {
                api: Arc::new(api),
                comments: comments.clone(),
                tenants: tenants.clone(),
                policy: Arc::new(KeywordPolicy),
                notifier: Arc::new(events.clone()),
            },
            &config,
        )
        .expect("Failed to start pipeline");

        let state = AppState {
            pipeline: Arc::new(pipeline),
            comments: comments.clone(),
            events: events.clone(),
        };
        let cors = CorsConfig {
            allow_origins: vec![],
            max_age: 3600,
        };
        let app = server::build_router(state, &cors);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            graph,
            comments,
            tenants,
            events,
        }
    }

    /// Opens a streaming GET and returns the response once headers arrive.
    pub async fn open_stream(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to open stream")
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_empty(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_raw(&self, path: &str, body: &'static str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }
}

/// Tenant with monitoring off, a live entitlement and Instagram credentials.
pub fn tenant(id: &str) -> Tenant {
    let mut tenant = Tenant::new(id);
    tenant.entitlement_expires_at = Some(Utc::now() + Duration::days(30));
    tenant.credentials.instagram_access_token = Some("ig-token".into());
    tenant.credentials.instagram_business_account_id = Some("ig-owner".into());
    tenant
}
