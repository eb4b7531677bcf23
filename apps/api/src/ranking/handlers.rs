//! Axum route handlers for sweeps and ranked reads.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::evaluation::EvaluationRecord;
use crate::ranking::{RankedJobs, SweepSummary};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct JobRankingQuery {
    pub limit: Option<usize>,
}

/// POST /api/v1/jobs/:id/evaluate
///
/// Scores every evaluable candidate against the job.
pub async fn handle_evaluate_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<SweepSummary>, AppError> {
    let summary = state
        .ranking
        .evaluate_job_against_all_candidates(job_id)
        .await?;
    Ok(Json(summary))
}

/// GET /api/v1/jobs/:id/rankings
pub async fn handle_job_rankings(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Vec<EvaluationRecord>>, AppError> {
    let ranked = state.ranking.rank_candidates_for_job(job_id).await?;
    Ok(Json(ranked))
}

/// POST /api/v1/candidates/:id/job-rankings?limit=N
///
/// Scores the candidate against the most recent jobs, best match first.
pub async fn handle_candidate_job_rankings(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
    Query(query): Query<JobRankingQuery>,
) -> Result<Json<RankedJobs>, AppError> {
    let limit = query.limit.unwrap_or(state.config.job_ranking_limit);
    if limit == 0 {
        return Err(AppError::Validation("limit must be at least 1".to_string()));
    }

    let ranked = state
        .ranking
        .evaluate_candidate_against_all_jobs(candidate_id, limit)
        .await?;
    Ok(Json(ranked))
}

/// GET /api/v1/candidates/:id/evaluations
pub async fn handle_candidate_evaluations(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
) -> Result<Json<Vec<EvaluationRecord>>, AppError> {
    let records = state.evaluations.list_for_candidate(candidate_id).await?;
    Ok(Json(records))
}

/// GET /api/v1/evaluations/:candidate_id/:job_id
pub async fn handle_get_evaluation(
    State(state): State<AppState>,
    Path((candidate_id, job_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<EvaluationRecord>, AppError> {
    state
        .evaluations
        .get(candidate_id, job_id)
        .await?
        .map(Json)
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "No evaluation for candidate {candidate_id} and job {job_id}"
            ))
        })
}
