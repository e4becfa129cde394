use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use api_client::MetaClient;
use common::storage::CommentStore;
use server::config::AppConfig;
use server::database::init_db;
use server::state::AppState;
use server::store::{SeaCommentStore, SeaTenantSource};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use worker::{BroadcastSink, KeywordPolicy, Pipeline, PipelineDeps};

/// Notifications buffered per event-stream subscriber before it lags.
const EVENT_BUFFER: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load().context("Failed to load config")?;
    let db = init_db(&config.database.url)
        .await
        .context("Failed to initialize database")?;
    info!("Database ready");

    let api = MetaClient::new(config.meta.clone()).context("Failed to build Graph API client")?;
    let events = BroadcastSink::new(EVENT_BUFFER);
    let comments: Arc<dyn CommentStore> = Arc::new(SeaCommentStore::new(db.clone()));
    let deps = PipelineDeps {
        api: Arc::new(api),
        comments: comments.clone(),
        tenants: Arc::new(SeaTenantSource::new(db)),
        policy: Arc::new(KeywordPolicy),
        notifier: Arc::new(events.clone()),
    };

    let pipeline = Arc::new(Pipeline::start(deps, &config.pipeline).context("Failed to start pipeline")?);
    let scheduler = pipeline.spawn_scheduler();
    let cleanup = pipeline.spawn_cleanup();

    // Set when the scheduler dies; the server then stops instead of idling.
    let (fatal_tx, fatal_rx) = watch::channel::<Option<String>>(None);
    tokio::spawn(async move {
        let failure = match scheduler.await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(e) => Some(format!("scheduler task aborted: {e}")),
        };
        if failure.is_some() {
            let _ = fatal_tx.send(failure);
        }
    });

    let app = server::build_router(
        AppState {
            pipeline: pipeline.clone(),
            comments,
            events,
        },
        &config.server.cors,
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}", addr);

    let mut scheduler_rx = fatal_rx.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("Shutdown signal received"),
                Ok(()) = scheduler_rx.changed() => error!("Scheduler failed, shutting down"),
            }
        })
        .await?;

    match Arc::try_unwrap(pipeline) {
        Ok(pipeline) => pipeline.shutdown().await,
        Err(_) => warn!("Pipeline still referenced at shutdown, skipping drain"),
    }
    cleanup.abort();

    if let Some(reason) = fatal_rx.borrow().clone() {
        anyhow::bail!("Scheduler stopped: {reason}");
    }
    Ok(())
}
