//! Axum route handlers for job postings and single evaluations.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::evaluation::{EvaluationRecord, EvaluationSource, JobSkills};
use crate::models::job::JobPosting;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub hr_email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub candidate_id: Uuid,
    pub job_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    pub record: EvaluationRecord,
    pub evaluation_source: EvaluationSource,
    pub scoring_attempts: u32,
    pub job_skills: JobSkills,
    pub notify_hr: bool,
    pub notification_message: String,
    pub errors: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    Json(request): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobPosting>), AppError> {
    if request.title.trim().is_empty() {
        return Err(AppError::Validation("title cannot be empty".to_string()));
    }
    if request.description.trim().is_empty() {
        return Err(AppError::Validation(
            "description cannot be empty".to_string(),
        ));
    }

    let mut job = JobPosting::new(request.title.trim(), request.description);
    job.hr_email = request
        .hr_email
        .filter(|e| !e.trim().is_empty())
        .or_else(|| state.config.hr_notify_email.clone())
        .unwrap_or_default();
    state.jobs.insert(job.clone()).await?;

    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobPosting>, AppError> {
    state
        .jobs
        .get(job_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Job not found: {job_id}")))
}

/// POST /api/v1/evaluations
///
/// Runs Graph 2 for one (candidate, job) pair and upserts the ranking record.
pub async fn handle_evaluate(
    State(state): State<AppState>,
    Json(request): Json<EvaluateRequest>,
) -> Result<Json<EvaluateResponse>, AppError> {
    let (run, record) = state
        .ranking
        .evaluate_pair(request.candidate_id, request.job_id)
        .await?;

    Ok(Json(EvaluateResponse {
        record,
        evaluation_source: run.evaluation_source,
        scoring_attempts: run.scoring_attempts,
        job_skills: run.job_skills,
        notify_hr: run.notify_hr,
        notification_message: run.notification_message,
        errors: run.errors.as_slice().to_vec(),
    }))
}
