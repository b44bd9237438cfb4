use std::sync::Arc;

use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

pub mod config;
pub mod jobs;
pub mod queue;
pub mod routes;
pub mod storage;

use config::AppConfig;
use jobs::{QueueTracker, StatusStore, StoreTracker, TieredTracker};
use queue::{FileJobQueue, FileJobQueueConfig, JobQueue};
use storage::{JsonKvStore, JsonKvStoreConfig};

/// Shared handle set for the HTTP surface.
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub status: StatusStore,
    pub queue: Arc<dyn JobQueue>,
    pub tracker: TieredTracker,
}

pub fn build_status_store(config: &AppConfig) -> StatusStore {
    StatusStore::new(Arc::new(JsonKvStore::new(JsonKvStoreConfig {
        working_dir: config.status_store_dir.clone(),
        namespace: "jobs".to_string(),
    })))
}

pub fn build_queue(config: &AppConfig) -> Arc<dyn JobQueue> {
    Arc::new(FileJobQueue::new(FileJobQueueConfig {
        broker_dir: config.broker_dir.clone(),
        result_backend_dir: config.result_backend_dir.clone(),
    }))
}

/// Store first, queue-native tracking second.
pub fn build_tracker(store: StatusStore, queue: Arc<dyn JobQueue>) -> TieredTracker {
    TieredTracker::new(vec![
        Arc::new(StoreTracker::new(store)),
        Arc::new(QueueTracker::new(queue)),
    ])
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                if stream.recv().await.is_some() {
                    info!("Received SIGTERM");
                }
            }
            Err(err) => warn!(error = %err, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received termination signal (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received termination signal (SIGTERM)");
        }
    }
}
