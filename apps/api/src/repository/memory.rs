use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{rank_order, CandidateRepository, EvaluationRepository, JobRepository, RepositoryError};
use crate::models::candidate::CandidateRecord;
use crate::models::evaluation::EvaluationRecord;
use crate::models::job::JobPosting;

/// Candidates kept in insertion order.
#[derive(Default)]
pub struct InMemoryCandidateRepository {
    records: RwLock<Vec<CandidateRecord>>,
}

#[async_trait]
impl CandidateRepository for InMemoryCandidateRepository {
    async fn insert(&self, record: CandidateRecord) -> Result<Uuid, RepositoryError> {
        let id = record.id;
        self.records.write().await.push(record);
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<CandidateRecord>, RepositoryError> {
        Ok(self.records.read().await.iter().find(|r| r.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<CandidateRecord>, RepositoryError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.candidate_email.eq_ignore_ascii_case(email))
            .cloned()
            .collect())
    }

    async fn find_by_batch(&self, batch_id: Uuid) -> Result<Vec<CandidateRecord>, RepositoryError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.batch_id == Some(batch_id))
            .cloned()
            .collect())
    }

    async fn list(&self) -> Result<Vec<CandidateRecord>, RepositoryError> {
        Ok(self.records.read().await.clone())
    }
}

#[derive(Default)]
pub struct InMemoryJobRepository {
    jobs: RwLock<Vec<JobPosting>>,
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn insert(&self, job: JobPosting) -> Result<Uuid, RepositoryError> {
        let id = job.id;
        self.jobs.write().await.push(job);
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<JobPosting>, RepositoryError> {
        Ok(self.jobs.read().await.iter().find(|j| j.id == id).cloned())
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<JobPosting>, RepositoryError> {
        let mut jobs = self.jobs.read().await.clone();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs.truncate(limit);
        Ok(jobs)
    }
}

/// Evaluation records keyed by (candidate_id, job_id); the write lock makes each upsert atomic.
#[derive(Default)]
pub struct InMemoryEvaluationRepository {
    records: RwLock<HashMap<(Uuid, Uuid), EvaluationRecord>>,
}

#[cfg(test)]
impl InMemoryEvaluationRepository {
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl EvaluationRepository for InMemoryEvaluationRepository {
    async fn upsert(&self, record: EvaluationRecord) -> Result<(), RepositoryError> {
        self.records
            .write()
            .await
            .insert((record.candidate_id, record.job_id), record);
        Ok(())
    }

    async fn get(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<EvaluationRecord>, RepositoryError> {
        Ok(self
            .records
            .read()
            .await
            .get(&(candidate_id, job_id))
            .cloned())
    }

    async fn list_for_job(&self, job_id: Uuid) -> Result<Vec<EvaluationRecord>, RepositoryError> {
        let mut records: Vec<_> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.job_id == job_id)
            .cloned()
            .collect();
        records.sort_by(rank_order);
        Ok(records)
    }

    async fn list_for_candidate(
        &self,
        candidate_id: Uuid,
    ) -> Result<Vec<EvaluationRecord>, RepositoryError> {
        let mut records: Vec<_> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.candidate_id == candidate_id)
            .cloned()
            .collect();
        records.sort_by(rank_order);
        Ok(records)
    }
}
