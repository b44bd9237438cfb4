use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    time::SystemTime,
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::warn;
use uuid::Uuid;

use crate::storage::io::{ensure_dir, read_json_file, write_json_file};

use super::{JobQueue, JobRequest, QueueJobState, QueueState, QueuedJob};

#[derive(Clone, Debug)]
pub struct FileJobQueueConfig {
    pub broker_dir: PathBuf,
    pub result_backend_dir: PathBuf,
}

/// Directory-backed broker.
///
/// Pending jobs are JSON files under `<broker_dir>/pending/`; a worker
/// claims one by renaming it into `<broker_dir>/claimed/` (the rename is the
/// mutual exclusion), and terminal outcomes land as records in the result
/// backend directory. A crashed worker leaves its claimed file behind;
/// redelivery of such jobs is an operational concern, not handled here.
pub struct FileJobQueue {
    pending_dir: PathBuf,
    claimed_dir: PathBuf,
    result_backend_dir: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct TerminalRecord {
    job_id: String,
    state: QueueState,
    result: Option<String>,
    error: Option<String>,
    finished_at: DateTime<Utc>,
}

impl FileJobQueue {
    pub fn new(config: FileJobQueueConfig) -> Self {
        let FileJobQueueConfig {
            broker_dir,
            result_backend_dir,
        } = config;

        Self {
            pending_dir: broker_dir.join("pending"),
            claimed_dir: broker_dir.join("claimed"),
            result_backend_dir,
        }
    }

    fn pending_path(&self, job_id: &str) -> PathBuf {
        self.pending_dir.join(format!("{job_id}.json"))
    }

    fn claimed_path(&self, job_id: &str) -> PathBuf {
        self.claimed_dir.join(format!("{job_id}.json"))
    }

    fn terminal_path(&self, job_id: &str) -> PathBuf {
        self.result_backend_dir.join(format!("{job_id}.json"))
    }

    async fn record_terminal(
        &self,
        job_id: &str,
        state: QueueState,
        result: Option<String>,
        error: Option<String>,
    ) -> Result<()> {
        let record = TerminalRecord {
            job_id: job_id.to_string(),
            state,
            result,
            error,
            finished_at: Utc::now(),
        };

        write_json_file(&self.terminal_path(job_id), &record)
            .await
            .with_context(|| format!("failed to record outcome for job {job_id}"))?;

        match fs::remove_file(self.claimed_path(job_id)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => {
                Err(err).with_context(|| format!("failed to drop claimed file for job {job_id}"))
            }
        }
    }

    async fn pending_oldest_first(&self) -> Result<Vec<PathBuf>> {
        let mut dir = match fs::read_dir(&self.pending_dir).await {
            Ok(dir) => dir,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err).context("failed to read pending queue directory"),
        };

        let mut entries: Vec<(Option<SystemTime>, PathBuf)> = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let modified = entry
                .metadata()
                .await
                .ok()
                .and_then(|meta| meta.modified().ok());
            entries.push((modified, path));
        }

        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries.into_iter().map(|(_, path)| path).collect())
    }
}

#[async_trait]
impl JobQueue for FileJobQueue {
    async fn initialize(&self) -> Result<()> {
        ensure_dir(&self.pending_dir).await?;
        ensure_dir(&self.claimed_dir).await?;
        ensure_dir(&self.result_backend_dir).await?;
        Ok(())
    }

    async fn enqueue(&self, request: JobRequest) -> Result<String> {
        let job_id = Uuid::new_v4().simple().to_string();
        let job = QueuedJob {
            job_id: job_id.clone(),
            file_path: request.file_path,
            enqueued_at: Utc::now(),
        };

        write_json_file(&self.pending_path(&job_id), &job)
            .await
            .with_context(|| format!("failed to enqueue job {job_id}"))?;
        Ok(job_id)
    }

    async fn dequeue(&self) -> Result<Option<QueuedJob>> {
        for path in self.pending_oldest_first().await? {
            let Some(name) = path.file_name() else {
                continue;
            };
            let claimed = self.claimed_dir.join(name);

            match fs::rename(&path, &claimed).await {
                Ok(()) => match read_json_file::<QueuedJob>(&claimed)
                    .await
                    .with_context(|| format!("failed to read claimed job at {}", claimed.display()))?
                {
                    Some(job) => return Ok(Some(job)),
                    None => {
                        warn!(path = %claimed.display(), "claimed job file was empty, skipping");
                        continue;
                    }
                },
                // another worker won the rename
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("failed to claim job at {}", path.display()));
                }
            }
        }

        Ok(None)
    }

    async fn complete(&self, job_id: &str, result: String) -> Result<()> {
        self.record_terminal(job_id, QueueState::Success, Some(result), None)
            .await
    }

    async fn fail(&self, job_id: &str, error: String) -> Result<()> {
        self.record_terminal(job_id, QueueState::Failed, None, Some(error))
            .await
    }

    async fn state(&self, job_id: &str) -> Result<QueueJobState> {
        if let Some(record) = read_json_file::<TerminalRecord>(&self.terminal_path(job_id)).await? {
            return Ok(QueueJobState {
                state: record.state,
                result: record.result,
                error: record.error,
            });
        }

        if fs::try_exists(&self.claimed_path(job_id)).await? {
            return Ok(QueueJobState {
                state: QueueState::Started,
                result: None,
                error: None,
            });
        }

        if fs::try_exists(&self.pending_path(job_id)).await? {
            return Ok(QueueJobState {
                state: QueueState::Pending,
                result: None,
                error: None,
            });
        }

        Ok(QueueJobState::unknown())
    }

    async fn list(&self) -> Result<Vec<(String, QueueJobState)>> {
        let mut jobs: BTreeMap<String, QueueJobState> = BTreeMap::new();

        for (dir, state) in [
            (&self.pending_dir, QueueState::Pending),
            (&self.claimed_dir, QueueState::Started),
        ] {
            for job_id in job_ids_in(dir).await? {
                jobs.insert(
                    job_id,
                    QueueJobState {
                        state,
                        result: None,
                        error: None,
                    },
                );
            }
        }

        for job_id in job_ids_in(&self.result_backend_dir).await? {
            if let Some(record) =
                read_json_file::<TerminalRecord>(&self.terminal_path(&job_id)).await?
            {
                jobs.insert(
                    job_id,
                    QueueJobState {
                        state: record.state,
                        result: record.result,
                        error: record.error,
                    },
                );
            }
        }

        Ok(jobs.into_iter().collect())
    }
}

async fn job_ids_in(dir: &Path) -> Result<Vec<String>> {
    let mut read_dir = match fs::read_dir(dir).await {
        Ok(read_dir) => read_dir,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", dir.display()));
        }
    };

    let mut ids = Vec::new();
    while let Some(entry) = read_dir.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            ids.push(stem.to_string());
        }
    }
    Ok(ids)
}
