//! Background agent: polls the portal for grade changes and raises
//! notification events until interrupted.

use anyhow::Context;
use ruppinet::client::PortalClient;
use ruppinet::config::AgentConfig;
use ruppinet::grades::{GradeCheckJob, GradePoller};
use ruppinet::notify::LogNotifier;
use ruppinet::storage::SqliteStore;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AgentConfig::from_env();
    info!(
        base_url = %config.portal.base_url,
        db = %config.db_path,
        "starting ruppinet agent"
    );

    let store = Arc::new(SqliteStore::open(&config.db_path).context("opening key-value store")?);
    let client =
        Arc::new(PortalClient::new(config.portal.clone()).context("building portal client")?);
    let poller = GradePoller::new(client, store, Arc::new(LogNotifier));
    let job = GradeCheckJob::new(
        poller,
        config.poll_interval,
        config.max_poll_retries,
        config.retry_base,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let job_handle = tokio::spawn(job.run(shutdown_rx));

    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);
    job_handle.await.context("joining grade check job")?;

    Ok(())
}
