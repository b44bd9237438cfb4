use std::sync::Arc;

use anyhow::{Context, Result};
use backend::{
    build_queue, build_status_store, config::load_config, init_tracing,
    jobs::{HttpExtractionClient, Worker},
    shutdown_signal,
};
use dotenvy::dotenv;
use tokio::time::Duration;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error!(error = %err, "Worker crashed");
        eprintln!("Worker crashed: {err}");
    }
}

async fn run() -> Result<()> {
    init_tracing();
    dotenv().ok();

    let config = load_config()
        .await
        .context("Failed to load application configuration")?;

    let status = build_status_store(&config);
    status
        .initialize()
        .await
        .context("Failed to initialize status store")?;

    let queue = build_queue(&config);
    queue
        .initialize()
        .await
        .context("Failed to initialize job queue")?;

    let extractor = Arc::new(
        HttpExtractionClient::new(&config.extraction)
            .context("Failed to build extraction client")?,
    );

    let worker = Worker::new(
        status,
        queue,
        extractor,
        Duration::from_millis(config.worker.poll_interval_ms),
    );

    info!(endpoint = %config.extraction.endpoint, "Worker started");

    tokio::select! {
        result = worker.run() => result.context("Worker loop failed")?,
        _ = shutdown_signal() => info!("Worker shutting down"),
    }

    Ok(())
}
