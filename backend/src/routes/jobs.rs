use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    AppState,
    jobs::{JobStatus, queue_state_label},
    queue::JobRequest,
};

const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Serialize)]
struct UploadResponse {
    task_id: String,
}

#[derive(Serialize)]
struct UploadMultipleResponse {
    task_ids: Vec<String>,
}

#[derive(Serialize)]
struct StatusResponse {
    task_id: String,
    status: String,
}

#[derive(Serialize)]
#[serde(untagged)]
enum ResultResponse {
    Ready { task_id: String, result: String },
    NotReady { task_id: String, status: String },
}

#[derive(Serialize)]
struct JobListResponse {
    total: usize,
    jobs: Vec<JobSummary>,
}

#[derive(Serialize)]
struct JobSummary {
    task_id: String,
    status: String,
}

pub fn job_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload", post(upload))
        .route("/upload-multiple", post(upload_multiple))
        .route("/status/{job_id}", get(job_status))
        .route("/result/{job_id}", get(job_result))
        .route("/jobs", get(list_jobs))
}

async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, String)> {
    while let Some(field) = multipart.next_field().await.map_err(|err| {
        (
            StatusCode::BAD_REQUEST,
            format!("invalid multipart payload: {err}"),
        )
    })? {
        if field.name() != Some("file") {
            continue;
        }

        if field.content_type() != Some(PDF_CONTENT_TYPE) {
            return Err((
                StatusCode::BAD_REQUEST,
                "Only PDF files are allowed.".to_string(),
            ));
        }

        let bytes = field.bytes().await.map_err(|err| {
            (
                StatusCode::BAD_REQUEST,
                format!("failed to read upload field: {err}"),
            )
        })?;

        let task_id = save_and_enqueue(&state, bytes.to_vec()).await?;
        return Ok(Json(UploadResponse { task_id }));
    }

    Err((
        StatusCode::BAD_REQUEST,
        "missing file field in multipart payload".to_string(),
    ))
}

async fn upload_multiple(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadMultipleResponse>, (StatusCode, String)> {
    let mut task_ids = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|err| {
        (
            StatusCode::BAD_REQUEST,
            format!("invalid multipart payload: {err}"),
        )
    })? {
        if field.name() != Some("files") {
            continue;
        }

        // non-PDF entries are skipped, not rejected
        if field.content_type() != Some(PDF_CONTENT_TYPE) {
            continue;
        }

        let bytes = field.bytes().await.map_err(|err| {
            (
                StatusCode::BAD_REQUEST,
                format!("failed to read upload field: {err}"),
            )
        })?;

        task_ids.push(save_and_enqueue(&state, bytes.to_vec()).await?);
    }

    Ok(Json(UploadMultipleResponse { task_ids }))
}

/// Persist the uploaded bytes under a generated unique name, enqueue the
/// extraction job, and mirror a PENDING status into the status store.
async fn save_and_enqueue(
    state: &AppState,
    bytes: Vec<u8>,
) -> Result<String, (StatusCode, String)> {
    let unique_name = format!("{}.pdf", Uuid::new_v4().simple());
    let save_path = state.config.upload_dir.join(&unique_name);

    fs::write(&save_path, &bytes).await.map_err(|err| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("failed to persist uploaded file: {err}"),
        )
    })?;

    let task_id = state
        .queue
        .enqueue(JobRequest {
            file_path: save_path,
        })
        .await
        .map_err(|err| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to enqueue job: {err}"),
            )
        })?;

    if let Err(err) = state.status.set_status(&task_id, JobStatus::Pending).await {
        // the job is queued either way; queue-native tracking still covers it
        warn!(error = %err, task_id = %task_id, "failed to record pending status");
    }

    info!(task_id = %task_id, file = %unique_name, "upload accepted");
    Ok(task_id)
}

async fn job_status(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Json<StatusResponse>, (StatusCode, String)> {
    let status = state
        .tracker
        .status(&job_id)
        .await
        .map_err(|err| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to look up job status: {err}"),
            )
        })?
        .unwrap_or_else(|| "UNKNOWN".to_string());

    Ok(Json(StatusResponse {
        task_id: job_id,
        status,
    }))
}

async fn job_result(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Json<ResultResponse>, (StatusCode, String)> {
    let lookup_failed = |err: anyhow::Error| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("failed to look up job result: {err}"),
        )
    };

    if let Some(result) = state.tracker.result(&job_id).await.map_err(lookup_failed)? {
        return Ok(Json(ResultResponse::Ready {
            task_id: job_id,
            result,
        }));
    }

    let status = state
        .tracker
        .status(&job_id)
        .await
        .map_err(lookup_failed)?
        .unwrap_or_else(|| "UNKNOWN".to_string());

    Ok(Json(ResultResponse::NotReady {
        task_id: job_id,
        status,
    }))
}

async fn list_jobs(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JobListResponse>, (StatusCode, String)> {
    let jobs = state.queue.list().await.map_err(|err| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("failed to list jobs: {err}"),
        )
    })?;

    let jobs: Vec<JobSummary> = jobs
        .into_iter()
        .map(|(task_id, state)| JobSummary {
            status: queue_state_label(&state),
            task_id,
        })
        .collect();

    Ok(Json(JobListResponse {
        total: jobs.len(),
        jobs,
    }))
}
