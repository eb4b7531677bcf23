//! Evaluate-and-store plus the two sweep directions and ranked reads.

pub mod handlers;

use std::cmp::Ordering;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::evaluation::EvaluationPipeline;
use crate::models::candidate::CandidateRecord;
use crate::models::evaluation::{EvaluationRecord, Tag};
use crate::models::job::JobPosting;
use crate::pipeline::state::EvaluationState;
use crate::repository::{
    CandidateRepository, EvaluationRepository, JobRepository, RepositoryError,
};

#[derive(Debug, Error)]
pub enum RankingError {
    #[error("Job not found: {0}")]
    JobNotFound(Uuid),

    #[error("Candidate not found: {0}")]
    CandidateNotFound(Uuid),

    #[error("Candidate {0} has no extracted data or summary to evaluate")]
    CandidateNotEvaluable(Uuid),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// One candidate's result in a job sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SweepEntry {
    pub candidate_id: Uuid,
    pub candidate_name: String,
    pub score: Option<u8>,
    pub tag: Option<Tag>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepSummary {
    pub job_id: Uuid,
    pub job_title: String,
    pub evaluated: usize,
    pub failed: usize,
    pub results: Vec<SweepEntry>,
}

/// One job's result when ranking jobs for a candidate.
#[derive(Debug, Clone, Serialize)]
pub struct JobRanking {
    pub job_id: Uuid,
    pub job_title: String,
    pub score: Option<u8>,
    pub tag: Option<Tag>,
    pub reasoning: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedJobs {
    pub candidate_id: Uuid,
    pub candidate_name: String,
    pub jobs_evaluated: usize,
    pub rankings: Vec<JobRanking>,
}

pub struct RankingService {
    candidates: Arc<dyn CandidateRepository>,
    jobs: Arc<dyn JobRepository>,
    evaluations: Arc<dyn EvaluationRepository>,
    pipeline: Arc<EvaluationPipeline>,
}

impl RankingService {
    pub fn new(
        candidates: Arc<dyn CandidateRepository>,
        jobs: Arc<dyn JobRepository>,
        evaluations: Arc<dyn EvaluationRepository>,
        pipeline: Arc<EvaluationPipeline>,
    ) -> Self {
        Self {
            candidates,
            jobs,
            evaluations,
            pipeline,
        }
    }

    /// Runs Graph 2 for the pair and upserts the outcome. The pipeline itself
    /// cannot fail; only the store write can.
    pub async fn evaluate_and_store(
        &self,
        job: &JobPosting,
        candidate: &CandidateRecord,
    ) -> Result<(EvaluationState, EvaluationRecord), RankingError> {
        let state = self.pipeline.run(job, candidate).await;
        let record = state.to_record();
        self.evaluations.upsert(record.clone()).await?;
        Ok((state, record))
    }

    /// Looks both sides up by id, then evaluates and stores.
    pub async fn evaluate_pair(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
    ) -> Result<(EvaluationState, EvaluationRecord), RankingError> {
        let job = self.require_job(job_id).await?;
        let candidate = self
            .candidates
            .get(candidate_id)
            .await?
            .ok_or(RankingError::CandidateNotFound(candidate_id))?;
        self.evaluate_and_store(&job, &candidate).await
    }

    /// Scores every evaluable candidate against the job. Candidates with neither
    /// extracted data nor a summary are skipped and not reported.
    pub async fn evaluate_job_against_all_candidates(
        &self,
        job_id: Uuid,
    ) -> Result<SweepSummary, RankingError> {
        let job = self.require_job(job_id).await?;
        let candidates = self.candidates.list().await?;
        let total = candidates.len();

        let mut results = Vec::new();
        for candidate in candidates.iter().filter(|c| c.is_evaluable()) {
            let entry = match self.evaluate_and_store(&job, candidate).await {
                Ok((_, record)) => SweepEntry {
                    candidate_id: candidate.id,
                    candidate_name: candidate.candidate_name.clone(),
                    score: record.score,
                    tag: record.tag,
                    error: None,
                },
                Err(e) => {
                    warn!(candidate_id = %candidate.id, "Sweep evaluation failed: {e}");
                    SweepEntry {
                        candidate_id: candidate.id,
                        candidate_name: candidate.candidate_name.clone(),
                        score: None,
                        tag: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            results.push(entry);
        }

        let failed = results.iter().filter(|r| r.error.is_some()).count();
        info!(
            job_id = %job.id,
            total,
            evaluated = results.len() - failed,
            failed,
            "Job sweep completed"
        );

        Ok(SweepSummary {
            job_id: job.id,
            job_title: job.title,
            evaluated: results.len() - failed,
            failed,
            results,
        })
    }

    /// Scores the candidate against up to `job_limit` most recent jobs and returns
    /// them best first.
    pub async fn evaluate_candidate_against_all_jobs(
        &self,
        candidate_id: Uuid,
        job_limit: usize,
    ) -> Result<RankedJobs, RankingError> {
        let candidate = self
            .candidates
            .get(candidate_id)
            .await?
            .ok_or(RankingError::CandidateNotFound(candidate_id))?;
        if !candidate.is_evaluable() {
            return Err(RankingError::CandidateNotEvaluable(candidate_id));
        }

        let jobs = self.jobs.list_recent(job_limit).await?;
        let mut rankings = Vec::with_capacity(jobs.len());
        for job in &jobs {
            let ranking = match self.evaluate_and_store(job, &candidate).await {
                Ok((state, record)) => JobRanking {
                    job_id: job.id,
                    job_title: job.title.clone(),
                    score: record.score,
                    tag: record.tag,
                    reasoning: state.evaluation.reasoning,
                    error: None,
                },
                Err(e) => {
                    warn!(job_id = %job.id, "Job ranking evaluation failed: {e}");
                    JobRanking {
                        job_id: job.id,
                        job_title: job.title.clone(),
                        score: None,
                        tag: None,
                        reasoning: String::new(),
                        error: Some(e.to_string()),
                    }
                }
            };
            rankings.push(ranking);
        }
        sort_job_rankings(&mut rankings);

        Ok(RankedJobs {
            candidate_id,
            candidate_name: candidate.candidate_name,
            jobs_evaluated: jobs.len(),
            rankings,
        })
    }

    pub async fn rank_candidates_for_job(
        &self,
        job_id: Uuid,
    ) -> Result<Vec<EvaluationRecord>, RankingError> {
        self.require_job(job_id).await?;
        Ok(self.evaluations.list_for_job(job_id).await?)
    }

    async fn require_job(&self, job_id: Uuid) -> Result<JobPosting, RankingError> {
        self.jobs
            .get(job_id)
            .await?
            .ok_or(RankingError::JobNotFound(job_id))
    }
}

/// Best score first; jobs without a score go last. The sort is stable, so equal
/// scores keep the recency order they were evaluated in.
pub fn sort_job_rankings(rankings: &mut [JobRanking]) {
    rankings.sort_by(|a, b| match (a.score, b.score) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
