use std::sync::Arc;

use anyhow::bail;
use async_trait::async_trait;
use backend::{
    jobs::{JobStatus, StatusStore, TextExtractor, Worker},
    queue::{FileJobQueue, FileJobQueueConfig, JobQueue, JobRequest, QueueState},
    storage::{JsonKvStore, JsonKvStoreConfig},
};
use tempfile::TempDir;
use tokio::time::Duration;

struct FixedExtractor {
    text: String,
}

#[async_trait]
impl TextExtractor for FixedExtractor {
    async fn extract(&self, _bytes: Vec<u8>) -> anyhow::Result<String> {
        Ok(self.text.clone())
    }
}

struct FailingExtractor;

#[async_trait]
impl TextExtractor for FailingExtractor {
    async fn extract(&self, _bytes: Vec<u8>) -> anyhow::Result<String> {
        bail!("extraction service returned 500 Internal Server Error: boom");
    }
}

fn status_store_in(dir: &TempDir) -> StatusStore {
    StatusStore::new(Arc::new(JsonKvStore::new(JsonKvStoreConfig {
        working_dir: dir.path().join("status"),
        namespace: "jobs".to_string(),
    })))
}

fn queue_in(dir: &TempDir) -> Arc<dyn JobQueue> {
    Arc::new(FileJobQueue::new(FileJobQueueConfig {
        broker_dir: dir.path().join("broker"),
        result_backend_dir: dir.path().join("results"),
    }))
}

async fn enqueue_upload(
    dir: &TempDir,
    queue: &Arc<dyn JobQueue>,
    contents: &[u8],
) -> anyhow::Result<String> {
    let file_path = dir.path().join("upload.pdf");
    tokio::fs::write(&file_path, contents).await?;
    queue.enqueue(JobRequest { file_path }).await
}

#[tokio::test]
async fn terminal_statuses_are_write_once() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = status_store_in(&dir);
    store.initialize().await?;

    store.set_status("job-1", JobStatus::Pending).await?;
    store.set_status("job-1", JobStatus::Started).await?;
    store.set_status("job-1", JobStatus::Success).await?;
    assert_eq!(store.status("job-1").await?, Some(JobStatus::Success));

    // a late failure report must not clobber the terminal status
    store
        .set_status("job-1", JobStatus::Failed("too late".to_string()))
        .await?;
    assert_eq!(store.status("job-1").await?, Some(JobStatus::Success));
    Ok(())
}

#[tokio::test]
async fn results_round_trip_byte_for_byte() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = status_store_in(&dir);
    store.initialize().await?;

    let text = "page one\n\npage two — naïve UTF-8 ✓\n";
    store.set_result("job-2", text).await?;
    assert_eq!(store.result("job-2").await?.as_deref(), Some(text));
    Ok(())
}

#[tokio::test]
async fn worker_drives_a_job_to_success() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = status_store_in(&dir);
    store.initialize().await?;
    let queue = queue_in(&dir);
    queue.initialize().await?;

    let job_id = enqueue_upload(&dir, &queue, b"%PDF-1.4 fake").await?;
    store.set_status(&job_id, JobStatus::Pending).await?;

    let worker = Worker::new(
        store.clone(),
        queue.clone(),
        Arc::new(FixedExtractor {
            text: "hello world".to_string(),
        }),
        Duration::from_millis(10),
    );

    let job = queue.dequeue().await?.expect("a pending job");
    worker.process(job).await;

    assert_eq!(store.status(&job_id).await?, Some(JobStatus::Success));
    assert_eq!(store.result(&job_id).await?.as_deref(), Some("hello world"));

    let queue_state = queue.state(&job_id).await?;
    assert_eq!(queue_state.state, QueueState::Success);
    assert_eq!(queue_state.result.as_deref(), Some("hello world"));
    Ok(())
}

#[tokio::test]
async fn worker_records_extraction_failures() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = status_store_in(&dir);
    store.initialize().await?;
    let queue = queue_in(&dir);
    queue.initialize().await?;

    let job_id = enqueue_upload(&dir, &queue, b"%PDF-1.4 fake").await?;
    store.set_status(&job_id, JobStatus::Pending).await?;

    let worker = Worker::new(
        store.clone(),
        queue.clone(),
        Arc::new(FailingExtractor),
        Duration::from_millis(10),
    );

    let job = queue.dequeue().await?.expect("a pending job");
    worker.process(job).await;

    match store.status(&job_id).await? {
        Some(JobStatus::Failed(reason)) => {
            assert!(reason.contains("extraction service returned 500"));
        }
        other => panic!("expected a failed status, got {other:?}"),
    }

    assert!(store.result(&job_id).await?.is_none());
    assert_eq!(queue.state(&job_id).await?.state, QueueState::Failed);
    Ok(())
}

#[tokio::test]
async fn worker_fails_jobs_whose_file_is_missing() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = status_store_in(&dir);
    store.initialize().await?;
    let queue = queue_in(&dir);
    queue.initialize().await?;

    let job_id = queue
        .enqueue(JobRequest {
            file_path: dir.path().join("vanished.pdf"),
        })
        .await?;

    let worker = Worker::new(
        store.clone(),
        queue.clone(),
        Arc::new(FixedExtractor {
            text: "unreachable".to_string(),
        }),
        Duration::from_millis(10),
    );

    let job = queue.dequeue().await?.expect("a pending job");
    worker.process(job).await;

    match store.status(&job_id).await? {
        Some(JobStatus::Failed(reason)) => assert!(reason.contains("failed to read")),
        other => panic!("expected a failed status, got {other:?}"),
    }
    assert_eq!(queue.state(&job_id).await?.state, QueueState::Failed);
    Ok(())
}
