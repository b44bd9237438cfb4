use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use tracing::warn;

use crate::storage::KvStorage;

use super::status::JobStatus;

/// Job-facing view over the shared key-value store.
///
/// Owns the `status:<job_id>` / `result:<job_id>` key scheme. Terminal
/// statuses are write-once: attempts to overwrite them are dropped with a
/// warning, which keeps repeated lookups after completion stable even if a
/// job were ever redelivered.
#[derive(Clone)]
pub struct StatusStore {
    kv: Arc<dyn KvStorage>,
}

impl StatusStore {
    pub fn new(kv: Arc<dyn KvStorage>) -> Self {
        Self { kv }
    }

    pub async fn initialize(&self) -> Result<()> {
        self.kv.initialize().await
    }

    fn status_key(job_id: &str) -> String {
        format!("status:{job_id}")
    }

    fn result_key(job_id: &str) -> String {
        format!("result:{job_id}")
    }

    pub async fn set_status(&self, job_id: &str, status: JobStatus) -> Result<()> {
        if let Some(current) = self.status(job_id).await? {
            if current.is_terminal() {
                warn!(
                    job_id = %job_id,
                    current = %current,
                    attempted = %status,
                    "ignoring status write for finished job"
                );
                return Ok(());
            }
        }

        self.kv
            .set(&Self::status_key(job_id), Value::String(status.to_string()))
            .await
    }

    pub async fn status(&self, job_id: &str) -> Result<Option<JobStatus>> {
        let value = self.kv.get(&Self::status_key(job_id)).await?;
        Ok(value
            .as_ref()
            .and_then(Value::as_str)
            .and_then(JobStatus::parse))
    }

    pub async fn set_result(&self, job_id: &str, text: &str) -> Result<()> {
        self.kv
            .set(&Self::result_key(job_id), Value::String(text.to_string()))
            .await
    }

    pub async fn result(&self, job_id: &str) -> Result<Option<String>> {
        let value = self.kv.get(&Self::result_key(job_id)).await?;
        Ok(value.and_then(|value| value.as_str().map(str::to_string)))
    }
}
