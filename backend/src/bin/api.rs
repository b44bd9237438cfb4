use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use backend::{
    AppState, build_queue, build_status_store, build_tracker, config::load_config, init_tracing,
    routes, shutdown_signal,
};
use dotenvy::dotenv;
use tokio::{fs, net::TcpListener};
use tracing::{error, info};
use tower_http::cors::CorsLayer;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error!(error = %err, "API service crashed");
        eprintln!("API service crashed: {err}");
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

    fs::create_dir_all(&config.upload_dir).await.with_context(|| {
        format!(
            "failed to create upload directory at {}",
            config.upload_dir.display()
        )
    })?;

    let tracker = build_tracker(status.clone(), queue.clone());

    let addr_string = format!("{}:{}", config.server.host, config.server.port);
    let addr = addr_string
        .parse::<SocketAddr>()
        .with_context(|| format!("Invalid server address: {addr_string}"))?;
    info!(host = %config.server.host, port = config.server.port, "Loaded configuration");

    let state = Arc::new(AppState {
        config: Arc::new(config),
        status,
        queue,
        tracker,
    });

    let app = Router::new()
        .route("/", get(banner))
        .route("/health", get(health))
        .merge(routes::job_routes())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind TCP listener on {addr}"))?;
    info!(%addr, "API service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server encountered a fatal error")?;
    Ok(())
}

async fn banner() -> &'static str {
    "PDF extraction service"
}

async fn health() -> &'static str {
    "ok"
}
