use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{CandidateRepository, EvaluationRepository, JobRepository, RepositoryError};
use crate::models::candidate::{CandidateRecord, ExtractedCv};
use crate::models::evaluation::{CandidateEvaluation, EvaluationRecord, SkillsMatch, Tag};
use crate::models::job::JobPosting;

const CANDIDATE_COLUMNS: &str = "id, user_id, user_email, candidate_name, candidate_email, \
    cv_object_name, cv_link, extracted_cv_data, summary, batch_id, errors, created_at";

const EVALUATION_COLUMNS: &str =
    "candidate_id, job_id, score, evaluation, skills_match, tag, evaluated_at";

/// Ranked reads use the same order as `repository::rank_order`.
const RANK_ORDER_SQL: &str =
    "ORDER BY score DESC NULLS LAST, evaluated_at ASC, candidate_id ASC, job_id ASC";

#[derive(Debug, FromRow)]
struct CandidateRow {
    id: Uuid,
    user_id: Option<String>,
    user_email: Option<String>,
    candidate_name: String,
    candidate_email: String,
    cv_object_name: String,
    cv_link: String,
    extracted_cv_data: Json<ExtractedCv>,
    summary: String,
    batch_id: Option<Uuid>,
    errors: Vec<String>,
    created_at: DateTime<Utc>,
}

impl From<CandidateRow> for CandidateRecord {
    fn from(row: CandidateRow) -> Self {
        CandidateRecord {
            id: row.id,
            user_id: row.user_id,
            user_email: row.user_email,
            candidate_name: row.candidate_name,
            candidate_email: row.candidate_email,
            cv_object_name: row.cv_object_name,
            cv_link: row.cv_link,
            extracted_cv_data: row.extracted_cv_data.0,
            summary: row.summary,
            batch_id: row.batch_id,
            errors: row.errors,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct JobRow {
    id: Uuid,
    title: String,
    description: String,
    hr_email: String,
    created_at: DateTime<Utc>,
}

impl From<JobRow> for JobPosting {
    fn from(row: JobRow) -> Self {
        JobPosting {
            id: row.id,
            title: row.title,
            description: row.description,
            hr_email: row.hr_email,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct EvaluationRow {
    candidate_id: Uuid,
    job_id: Uuid,
    score: Option<i32>,
    evaluation: Json<CandidateEvaluation>,
    skills_match: Json<SkillsMatch>,
    tag: Option<String>,
    evaluated_at: DateTime<Utc>,
}

impl TryFrom<EvaluationRow> for EvaluationRecord {
    type Error = RepositoryError;

    fn try_from(row: EvaluationRow) -> Result<Self, Self::Error> {
        let score = row
            .score
            .map(|s| {
                u8::try_from(s).map_err(|_| RepositoryError::Corrupt(format!("score {s}")))
            })
            .transpose()?;
        let tag = row
            .tag
            .map(|t| Tag::parse(&t).ok_or_else(|| RepositoryError::Corrupt(format!("tag {t}"))))
            .transpose()?;

        Ok(EvaluationRecord {
            candidate_id: row.candidate_id,
            job_id: row.job_id,
            score,
            evaluation: row.evaluation.0,
            skills_match: row.skills_match.0,
            tag,
            evaluated_at: row.evaluated_at,
        })
    }
}

fn into_records(rows: Vec<EvaluationRow>) -> Result<Vec<EvaluationRecord>, RepositoryError> {
    rows.into_iter().map(EvaluationRecord::try_from).collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Candidates
// ────────────────────────────────────────────────────────────────────────────

pub struct PgCandidateRepository {
    pool: PgPool,
}

impl PgCandidateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CandidateRepository for PgCandidateRepository {
    async fn insert(&self, record: CandidateRecord) -> Result<Uuid, RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO candidates
                (id, user_id, user_email, candidate_name, candidate_email, cv_object_name,
                 cv_link, extracted_cv_data, summary, batch_id, errors, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(record.id)
        .bind(&record.user_id)
        .bind(&record.user_email)
        .bind(&record.candidate_name)
        .bind(&record.candidate_email)
        .bind(&record.cv_object_name)
        .bind(&record.cv_link)
        .bind(Json(&record.extracted_cv_data))
        .bind(&record.summary)
        .bind(record.batch_id)
        .bind(&record.errors)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(record.id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<CandidateRecord>, RepositoryError> {
        let row = sqlx::query_as::<_, CandidateRow>(&format!(
            "SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<CandidateRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, CandidateRow>(&format!(
            "SELECT {CANDIDATE_COLUMNS} FROM candidates \
             WHERE lower(candidate_email) = lower($1) ORDER BY created_at ASC"
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_batch(&self, batch_id: Uuid) -> Result<Vec<CandidateRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, CandidateRow>(&format!(
            "SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE batch_id = $1 ORDER BY created_at ASC"
        ))
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list(&self) -> Result<Vec<CandidateRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, CandidateRow>(&format!(
            "SELECT {CANDIDATE_COLUMNS} FROM candidates ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Jobs
// ────────────────────────────────────────────────────────────────────────────

pub struct PgJobRepository {
    pool: PgPool,
}

impl PgJobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRepository for PgJobRepository {
    async fn insert(&self, job: JobPosting) -> Result<Uuid, RepositoryError> {
        sqlx::query(
            "INSERT INTO jobs (id, title, description, hr_email, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(job.id)
        .bind(&job.title)
        .bind(&job.description)
        .bind(&job.hr_email)
        .bind(job.created_at)
        .execute(&self.pool)
        .await?;
        Ok(job.id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<JobPosting>, RepositoryError> {
        let row = sqlx::query_as::<_, JobRow>(
            "SELECT id, title, description, hr_email, created_at FROM jobs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<JobPosting>, RepositoryError> {
        let rows = sqlx::query_as::<_, JobRow>(
            "SELECT id, title, description, hr_email, created_at FROM jobs \
             ORDER BY created_at DESC LIMIT $1",
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Evaluations
// ────────────────────────────────────────────────────────────────────────────

pub struct PgEvaluationRepository {
    pool: PgPool,
}

impl PgEvaluationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EvaluationRepository for PgEvaluationRepository {
    async fn upsert(&self, record: EvaluationRecord) -> Result<(), RepositoryError> {
        // Single conditional write keyed by the pair's primary key.
        sqlx::query(
            r#"
            INSERT INTO candidate_evaluations
                (candidate_id, job_id, score, evaluation, skills_match, tag, evaluated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (candidate_id, job_id) DO UPDATE SET
                score = EXCLUDED.score,
                evaluation = EXCLUDED.evaluation,
                skills_match = EXCLUDED.skills_match,
                tag = EXCLUDED.tag,
                evaluated_at = EXCLUDED.evaluated_at
            "#,
        )
        .bind(record.candidate_id)
        .bind(record.job_id)
        .bind(record.score.map(i32::from))
        .bind(Json(&record.evaluation))
        .bind(Json(&record.skills_match))
        .bind(record.tag.map(|t| t.as_str()))
        .bind(record.evaluated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<EvaluationRecord>, RepositoryError> {
        let row = sqlx::query_as::<_, EvaluationRow>(&format!(
            "SELECT {EVALUATION_COLUMNS} FROM candidate_evaluations \
             WHERE candidate_id = $1 AND job_id = $2"
        ))
        .bind(candidate_id)
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(EvaluationRecord::try_from).transpose()
    }

    async fn list_for_job(&self, job_id: Uuid) -> Result<Vec<EvaluationRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, EvaluationRow>(&format!(
            "SELECT {EVALUATION_COLUMNS} FROM candidate_evaluations WHERE job_id = $1 {RANK_ORDER_SQL}"
        ))
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;
        into_records(rows)
    }

    async fn list_for_candidate(
        &self,
        candidate_id: Uuid,
    ) -> Result<Vec<EvaluationRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, EvaluationRow>(&format!(
            "SELECT {EVALUATION_COLUMNS} FROM candidate_evaluations WHERE candidate_id = $1 {RANK_ORDER_SQL}"
        ))
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?;
        into_records(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(score: Option<i32>, tag: Option<&str>) -> EvaluationRow {
        EvaluationRow {
            candidate_id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            score,
            evaluation: Json(CandidateEvaluation::neutral("stored")),
            skills_match: Json(SkillsMatch::default()),
            tag: tag.map(str::to_string),
            evaluated_at: Utc::now(),
        }
    }

    #[test]
    fn test_evaluation_row_converts_score_and_tag() {
        let record = EvaluationRecord::try_from(row(Some(77), Some("high_potential"))).unwrap();
        assert_eq!(record.score, Some(77));
        assert_eq!(record.tag, Some(Tag::HighPotential));
    }

    #[test]
    fn test_evaluation_row_with_null_score_stays_missing() {
        let record = EvaluationRecord::try_from(row(None, None)).unwrap();
        assert_eq!(record.score, None);
        assert_eq!(record.tag, None);
    }

    #[test]
    fn test_evaluation_row_rejects_unknown_tag() {
        let err = EvaluationRecord::try_from(row(Some(10), Some("error"))).unwrap_err();
        assert!(matches!(err, RepositoryError::Corrupt(_)));
    }

    #[test]
    fn test_evaluation_row_rejects_negative_score() {
        let err = EvaluationRecord::try_from(row(Some(-3), None)).unwrap_err();
        assert!(matches!(err, RepositoryError::Corrupt(_)));
    }
}
