//! Axum route handlers for batch intake.

use std::path::PathBuf;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::batch::BatchReport;
use crate::errors::AppError;
use crate::models::candidate::{CandidateRecord, CandidateSubmission};
use crate::models::job::JobPosting;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub job_id: Uuid,
    pub candidates: Vec<CandidateSubmission>,
    /// Defaults to `BATCH_MAX_CONCURRENT`.
    #[serde(default)]
    pub max_concurrent: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct DirectoryBatchRequest {
    pub job_id: Uuid,
    /// Relative to `CV_INTAKE_DIR`, or an absolute path inside it.
    pub directory: PathBuf,
    #[serde(default)]
    pub max_concurrent: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct BatchQuery {
    /// Hold the request open until the batch finishes and answer with its summary.
    #[serde(default)]
    pub wait: bool,
}

async fn load_job(state: &AppState, job_id: Uuid) -> Result<JobPosting, AppError> {
    state
        .jobs
        .get(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job not found: {job_id}")))
}

/// POST /api/v1/batches?wait=false
///
/// Starts processing every submitted CV in the background and answers 202 with
/// the batch id. Poll `GET /api/v1/batches/:id` for the summary. With
/// `wait=true` the request blocks until both phases finish and answers 200
/// with the completed report; large batches can outlive client timeouts.
pub async fn handle_run_batch(
    State(state): State<AppState>,
    Query(query): Query<BatchQuery>,
    Json(request): Json<BatchRequest>,
) -> Result<(StatusCode, Json<BatchReport>), AppError> {
    if request.candidates.is_empty() {
        return Err(AppError::Validation(
            "candidates cannot be empty".to_string(),
        ));
    }
    let job = load_job(&state, request.job_id).await?;
    let max_concurrent = request
        .max_concurrent
        .unwrap_or(state.config.batch_max_concurrent);

    if query.wait {
        let summary = state
            .batches
            .run(request.candidates, &job, max_concurrent)
            .await?;
        return Ok((StatusCode::OK, Json(BatchReport::Completed(summary))));
    }
    let report = state
        .batches
        .start(request.candidates, job, max_concurrent)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(report)))
}

/// POST /api/v1/batches/directory?wait=false
///
/// Same as `POST /api/v1/batches` for every CV file in a folder under the intake directory.
pub async fn handle_run_directory_batch(
    State(state): State<AppState>,
    Query(query): Query<BatchQuery>,
    Json(request): Json<DirectoryBatchRequest>,
) -> Result<(StatusCode, Json<BatchReport>), AppError> {
    let job = load_job(&state, request.job_id).await?;
    let max_concurrent = request
        .max_concurrent
        .unwrap_or(state.config.batch_max_concurrent);

    if query.wait {
        let summary = state
            .batches
            .run_directory(&request.directory, &job, max_concurrent)
            .await?;
        return Ok((StatusCode::OK, Json(BatchReport::Completed(summary))));
    }

    let report = state
        .batches
        .start_directory(&request.directory, job, max_concurrent)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(report)))
}

/// GET /api/v1/batches/:id
pub async fn handle_batch_report(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> Result<Json<BatchReport>, AppError> {
    state
        .batches
        .report(batch_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Batch not found: {batch_id}")))
}

/// GET /api/v1/batches/:id/candidates
pub async fn handle_batch_candidates(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> Result<Json<Vec<CandidateRecord>>, AppError> {
    let candidates = state.candidates.find_by_batch(batch_id).await?;
    Ok(Json(candidates))
}
