use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::queue::{JobQueue, QueueJobState, QueueState};

use super::store::StatusStore;

/// One tier of job bookkeeping. `None` means this tier has never heard of
/// the job and the next tier should be consulted.
#[async_trait]
pub trait JobTracker: Send + Sync {
    async fn status(&self, job_id: &str) -> Result<Option<String>>;
    async fn result(&self, job_id: &str) -> Result<Option<String>>;
}

/// Fast, authoritative tier backed by the status store.
pub struct StoreTracker {
    store: StatusStore,
}

impl StoreTracker {
    pub fn new(store: StatusStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl JobTracker for StoreTracker {
    async fn status(&self, job_id: &str) -> Result<Option<String>> {
        Ok(self
            .store
            .status(job_id)
            .await?
            .map(|status| status.to_string()))
    }

    async fn result(&self, job_id: &str) -> Result<Option<String>> {
        self.store.result(job_id).await
    }
}

/// Fallback tier backed by the queue's native tracking. Always answers
/// status lookups, reporting `UNKNOWN` for ids the queue has never seen.
pub struct QueueTracker {
    queue: Arc<dyn JobQueue>,
}

impl QueueTracker {
    pub fn new(queue: Arc<dyn JobQueue>) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl JobTracker for QueueTracker {
    async fn status(&self, job_id: &str) -> Result<Option<String>> {
        let state = self.queue.state(job_id).await?;
        Ok(Some(queue_state_label(&state)))
    }

    async fn result(&self, job_id: &str) -> Result<Option<String>> {
        let state = self.queue.state(job_id).await?;
        Ok(match state.state {
            QueueState::Success => state.result,
            _ => None,
        })
    }
}

/// Priority-ordered composition of trackers; the first tier with an answer
/// wins.
pub struct TieredTracker {
    tiers: Vec<Arc<dyn JobTracker>>,
}

impl TieredTracker {
    pub fn new(tiers: Vec<Arc<dyn JobTracker>>) -> Self {
        Self { tiers }
    }

    pub async fn status(&self, job_id: &str) -> Result<Option<String>> {
        for tier in &self.tiers {
            if let Some(status) = tier.status(job_id).await? {
                return Ok(Some(status));
            }
        }
        Ok(None)
    }

    pub async fn result(&self, job_id: &str) -> Result<Option<String>> {
        for tier in &self.tiers {
            if let Some(result) = tier.result(job_id).await? {
                return Ok(Some(result));
            }
        }
        Ok(None)
    }
}

pub fn queue_state_label(state: &QueueJobState) -> String {
    match state.state {
        QueueState::Pending => "PENDING".to_string(),
        QueueState::Started => "STARTED".to_string(),
        QueueState::Success => "SUCCESS".to_string(),
        QueueState::Failed => match &state.error {
            Some(error) => format!("FAIL: {error}"),
            None => "FAIL: unknown error".to_string(),
        },
        QueueState::Unknown => "UNKNOWN".to_string(),
    }
}
