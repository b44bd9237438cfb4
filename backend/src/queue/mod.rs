use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod file_queue;

pub use file_queue::{FileJobQueue, FileJobQueueConfig};

/// A request to extract text from one saved upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRequest {
    pub file_path: PathBuf,
}

/// A job as delivered to a worker. The id was assigned by the queue when
/// the request was enqueued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedJob {
    pub job_id: String,
    pub file_path: PathBuf,
    pub enqueued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueState {
    Pending,
    Started,
    Success,
    Failed,
    Unknown,
}

/// What the queue's own bookkeeping knows about a job, independent of the
/// status store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueJobState {
    pub state: QueueState,
    pub result: Option<String>,
    pub error: Option<String>,
}

impl QueueJobState {
    pub fn unknown() -> Self {
        Self {
            state: QueueState::Unknown,
            result: None,
            error: None,
        }
    }
}

/// Durable at-least-once delivery channel between the API and workers.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn initialize(&self) -> Result<()>;

    /// Enqueue a request; the queue assigns and returns the job id.
    async fn enqueue(&self, request: JobRequest) -> Result<String>;

    /// Claim the oldest pending job, if any. A job is delivered to at most
    /// one claimant at a time.
    async fn dequeue(&self) -> Result<Option<QueuedJob>>;

    async fn complete(&self, job_id: &str, result: String) -> Result<()>;
    async fn fail(&self, job_id: &str, error: String) -> Result<()>;

    /// The queue's native per-job tracking. `Unknown` for ids this queue
    /// has never seen.
    async fn state(&self, job_id: &str) -> Result<QueueJobState>;

    async fn list(&self) -> Result<Vec<(String, QueueJobState)>>;
}
