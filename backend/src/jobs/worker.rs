use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{
    fs,
    time::{Duration, sleep},
};
use tracing::{error, info};

use crate::queue::{JobQueue, QueuedJob};

use super::{extractor::TextExtractor, status::JobStatus, store::StatusStore};

/// Processes one job at a time: claim, mark started, call the extraction
/// service, record the terminal outcome in both the status store and the
/// queue's own bookkeeping. No retries; the queue's redelivery policy, if
/// any, is the only retry mechanism.
pub struct Worker {
    store: StatusStore,
    queue: Arc<dyn JobQueue>,
    extractor: Arc<dyn TextExtractor>,
    poll_interval: Duration,
}

impl Worker {
    pub fn new(
        store: StatusStore,
        queue: Arc<dyn JobQueue>,
        extractor: Arc<dyn TextExtractor>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            store,
            queue,
            extractor,
            poll_interval,
        }
    }

    /// Pull and process jobs until the queue itself becomes unreadable.
    pub async fn run(&self) -> Result<()> {
        loop {
            match self.queue.dequeue().await? {
                Some(job) => self.process(job).await,
                None => sleep(self.poll_interval).await,
            }
        }
    }

    /// Drive one claimed job to a terminal state. Never returns an error:
    /// failures are recorded in the status store and reported to the queue.
    pub async fn process(&self, job: QueuedJob) {
        let job_id = job.job_id.clone();
        info!(job_id = %job_id, path = %job.file_path.display(), "processing job");

        if let Err(err) = self.store.set_status(&job_id, JobStatus::Started).await {
            error!(error = %err, job_id = %job_id, "failed to mark job started");
        }

        match self.extract(&job).await {
            Ok(text) => {
                if let Err(err) = self.finish_success(&job_id, text).await {
                    error!(error = %err, job_id = %job_id, "failed to record job success");
                }
            }
            Err(err) => {
                error!(error = %err, job_id = %job_id, "job failed");
                if let Err(record_err) = self.finish_failure(&job_id, &err).await {
                    error!(error = %record_err, job_id = %job_id, "failed to record job failure");
                }
            }
        }
    }

    async fn extract(&self, job: &QueuedJob) -> Result<String> {
        let bytes = fs::read(&job.file_path)
            .await
            .with_context(|| format!("failed to read {}", job.file_path.display()))?;
        self.extractor.extract(bytes).await
    }

    async fn finish_success(&self, job_id: &str, text: String) -> Result<()> {
        // result first, so a SUCCESS status always has a readable result
        self.store.set_result(job_id, &text).await?;
        self.store.set_status(job_id, JobStatus::Success).await?;
        self.queue.complete(job_id, text).await?;
        info!(job_id = %job_id, "job succeeded");
        Ok(())
    }

    async fn finish_failure(&self, job_id: &str, err: &anyhow::Error) -> Result<()> {
        let diagnostic = format!("{err:#}");
        self.store
            .set_status(job_id, JobStatus::Failed(diagnostic.clone()))
            .await?;
        self.queue.fail(job_id, diagnostic).await?;
        Ok(())
    }
}
