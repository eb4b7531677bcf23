//! Persistence seams for candidates, jobs and evaluation records.
//!
//! Postgres backs production; the in-memory implementations serve tests and
//! deployments started without `DATABASE_URL`.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::candidate::CandidateRecord;
use crate::models::evaluation::EvaluationRecord;
use crate::models::job::JobPosting;

pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored value is invalid: {0}")]
    Corrupt(String),
}

#[async_trait]
pub trait CandidateRepository: Send + Sync {
    /// Writes a new candidate document and returns its id.
    async fn insert(&self, record: CandidateRecord) -> Result<Uuid, RepositoryError>;

    async fn get(&self, id: Uuid) -> Result<Option<CandidateRecord>, RepositoryError>;

    async fn find_by_email(&self, email: &str) -> Result<Vec<CandidateRecord>, RepositoryError>;

    async fn find_by_batch(&self, batch_id: Uuid) -> Result<Vec<CandidateRecord>, RepositoryError>;

    /// All candidates, oldest first.
    async fn list(&self) -> Result<Vec<CandidateRecord>, RepositoryError>;
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn insert(&self, job: JobPosting) -> Result<Uuid, RepositoryError>;

    async fn get(&self, id: Uuid) -> Result<Option<JobPosting>, RepositoryError>;

    /// Up to `limit` postings, most recently created first.
    async fn list_recent(&self, limit: usize) -> Result<Vec<JobPosting>, RepositoryError>;
}

/// Ranking store: exactly one record per (candidate_id, job_id).
#[async_trait]
pub trait EvaluationRepository: Send + Sync {
    /// Inserts the record or replaces the existing one for the same pair in a single write.
    async fn upsert(&self, record: EvaluationRecord) -> Result<(), RepositoryError>;

    async fn get(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<EvaluationRecord>, RepositoryError>;

    /// Records for a job, best score first (see [`rank_order`]).
    async fn list_for_job(&self, job_id: Uuid) -> Result<Vec<EvaluationRecord>, RepositoryError>;

    /// Records for a candidate, best score first (see [`rank_order`]).
    async fn list_for_candidate(
        &self,
        candidate_id: Uuid,
    ) -> Result<Vec<EvaluationRecord>, RepositoryError>;
}

/// Ordering shared by every ranked read: score descending with missing scores last,
/// then older evaluations first, then candidate and job id for a total order.
pub fn rank_order(a: &EvaluationRecord, b: &EvaluationRecord) -> std::cmp::Ordering {
    b.score
        .is_some()
        .cmp(&a.score.is_some())
        .then_with(|| b.score.cmp(&a.score))
        .then_with(|| a.evaluated_at.cmp(&b.evaluated_at))
        .then_with(|| a.candidate_id.cmp(&b.candidate_id))
        .then_with(|| a.job_id.cmp(&b.job_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    use crate::models::evaluation::{CandidateEvaluation, SkillsMatch};

    fn record(score: Option<u8>, age_secs: i64) -> EvaluationRecord {
        EvaluationRecord {
            candidate_id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            score,
            evaluation: CandidateEvaluation::neutral("r"),
            skills_match: SkillsMatch::default(),
            tag: None,
            evaluated_at: Utc::now() - Duration::seconds(age_secs),
        }
    }

    #[test]
    fn test_rank_order_puts_missing_scores_last() {
        let mut records = vec![record(Some(80), 0), record(None, 0), record(Some(95), 0)];
        records.sort_by(rank_order);
        let scores: Vec<_> = records.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![Some(95), Some(80), None]);
    }

    #[test]
    fn test_rank_order_ties_break_on_older_evaluation_first() {
        let newer = record(Some(70), 10);
        let older = record(Some(70), 100);
        let mut records = vec![newer.clone(), older.clone()];
        records.sort_by(rank_order);
        assert_eq!(records[0].candidate_id, older.candidate_id);
        assert_eq!(records[1].candidate_id, newer.candidate_id);
    }
}
