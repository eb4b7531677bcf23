//! Batch intake: Graph 1 over many CVs with bounded concurrency, then every
//! successful candidate scored against one job.
//!
//! Submitted paths are resolved against the intake directory and must stay
//! inside it after canonicalisation. HTTP callers start a batch in the
//! background and poll its report.

pub mod handlers;

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{RwLock, Semaphore};
use tokio::task::JoinSet;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::documents::is_supported;
use crate::extraction::ExtractionPipeline;
use crate::models::candidate::{CandidateIdentity, CandidateRecord, CandidateSubmission};
use crate::models::evaluation::Tag;
use crate::models::job::JobPosting;
use crate::ranking::RankingService;

pub const MIN_CONCURRENCY: usize = 1;
pub const MAX_CONCURRENCY: usize = 20;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("max_concurrent must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}, got {0}")]
    InvalidConcurrency(usize),

    #[error("CV directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("CV directory is outside the intake directory: {0}")]
    OutsideIntakeDir(PathBuf),

    #[error("CV intake directory {path} is unavailable: {source}")]
    IntakeDirUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No CV files (.pdf, .txt, .md) found in {0}")]
    NoCvFiles(PathBuf),

    #[error("Failed to read CV directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Graph 1 result for one submission.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateOutcome {
    pub index: usize,
    pub candidate_name: String,
    pub candidate_email: String,
    pub cv_file_path: String,
    pub candidate_id: Option<Uuid>,
    pub success: bool,
    pub errors: Vec<String>,
    pub processing_time_ms: u64,
}

/// Phase-2 result for one successful candidate.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationOutcome {
    pub candidate_id: Uuid,
    pub candidate_name: String,
    pub score: Option<u8>,
    pub tag: Option<Tag>,
    pub notify_hr: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub batch_id: Uuid,
    pub job_id: Uuid,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub average_score: f64,
    pub highest_score: u8,
    pub lowest_score: u8,
    pub total_processing_time_ms: u64,
    pub average_processing_time_ms: f64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub candidates: Vec<CandidateOutcome>,
    pub evaluations: Vec<EvaluationOutcome>,
}

/// Where a batch started through [`BatchCoordinator::start`] stands.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchReport {
    Running {
        batch_id: Uuid,
        job_id: Uuid,
        total: usize,
        started_at: DateTime<Utc>,
    },
    Completed(BatchSummary),
    Failed {
        batch_id: Uuid,
        job_id: Uuid,
        error: String,
    },
}

struct TaskResult {
    outcome: CandidateOutcome,
    record: Option<CandidateRecord>,
}

impl TaskResult {
    fn failed(index: usize, submission: &CandidateSubmission, error: String) -> Self {
        Self {
            outcome: CandidateOutcome {
                index,
                candidate_name: submission.identity.name.clone(),
                candidate_email: submission.identity.email.clone(),
                cv_file_path: submission.cv_file_path.clone(),
                candidate_id: None,
                success: false,
                errors: vec![error],
                processing_time_ms: 0,
            },
            record: None,
        }
    }
}

pub struct BatchCoordinator {
    extraction: Arc<ExtractionPipeline>,
    ranking: Arc<RankingService>,
    intake_dir: PathBuf,
    /// Reports of batches started in the background, kept for the process lifetime.
    reports: RwLock<HashMap<Uuid, BatchReport>>,
}

impl BatchCoordinator {
    pub fn new(
        extraction: Arc<ExtractionPipeline>,
        ranking: Arc<RankingService>,
        intake_dir: PathBuf,
    ) -> Self {
        Self {
            extraction,
            ranking,
            intake_dir,
            reports: RwLock::new(HashMap::new()),
        }
    }

    /// Runs the batch to completion and returns its summary.
    pub async fn run(
        &self,
        submissions: Vec<CandidateSubmission>,
        job: &JobPosting,
        max_concurrent: usize,
    ) -> Result<BatchSummary, BatchError> {
        validate_concurrency(max_concurrent)?;
        Ok(self
            .execute(Uuid::now_v7(), submissions, job, max_concurrent)
            .await)
    }

    /// [`run`](Self::run) over every supported CV file in `dir`, sorted by name.
    pub async fn run_directory(
        &self,
        dir: &Path,
        job: &JobPosting,
        max_concurrent: usize,
    ) -> Result<BatchSummary, BatchError> {
        validate_concurrency(max_concurrent)?;
        let dir = self.resolve_directory(dir).await?;
        let submissions = submissions_from_directory(&dir).await?;
        self.run(submissions, job, max_concurrent).await
    }

    /// Validates the request, then runs the batch on a background task.
    /// Returns the `Running` report; poll [`report`](Self::report) for the outcome.
    pub async fn start(
        self: &Arc<Self>,
        submissions: Vec<CandidateSubmission>,
        job: JobPosting,
        max_concurrent: usize,
    ) -> Result<BatchReport, BatchError> {
        validate_concurrency(max_concurrent)?;

        let batch_id = Uuid::now_v7();
        let running = BatchReport::Running {
            batch_id,
            job_id: job.id,
            total: submissions.len(),
            started_at: Utc::now(),
        };
        self.reports.write().await.insert(batch_id, running.clone());

        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            let work = coordinator.execute(batch_id, submissions, &job, max_concurrent);
            let report = match AssertUnwindSafe(work).catch_unwind().await {
                Ok(summary) => BatchReport::Completed(summary),
                Err(panic) => {
                    let error = format!("Batch panicked: {}", panic_message(&*panic));
                    error!(%batch_id, "{error}");
                    BatchReport::Failed {
                        batch_id,
                        job_id: job.id,
                        error,
                    }
                }
            };
            coordinator.reports.write().await.insert(batch_id, report);
        });

        Ok(running)
    }

    /// [`start`](Self::start) over every supported CV file in `dir`, sorted by name.
    pub async fn start_directory(
        self: &Arc<Self>,
        dir: &Path,
        job: JobPosting,
        max_concurrent: usize,
    ) -> Result<BatchReport, BatchError> {
        validate_concurrency(max_concurrent)?;
        let dir = self.resolve_directory(dir).await?;
        let submissions = submissions_from_directory(&dir).await?;
        self.start(submissions, job, max_concurrent).await
    }

    pub async fn report(&self, batch_id: Uuid) -> Option<BatchReport> {
        self.reports.read().await.get(&batch_id).cloned()
    }

    /// Runs both phases to completion under the given batch id.
    async fn execute(
        &self,
        batch_id: Uuid,
        submissions: Vec<CandidateSubmission>,
        job: &JobPosting,
        max_concurrent: usize,
    ) -> BatchSummary {
        let started_at = Utc::now();
        let clock = Instant::now();
        let total = submissions.len();
        let span = info_span!("batch", %batch_id, job_id = %job.id, total, max_concurrent);

        async move {
            info!("Batch started");
            let results = self.extract_all(submissions, batch_id, max_concurrent).await;
            let evaluations = self.evaluate_successful(&results, job).await;

            let candidates: Vec<CandidateOutcome> =
                results.into_iter().map(|r| r.outcome).collect();
            let successful = candidates.iter().filter(|c| c.success).count();
            let summary = summarize(
                batch_id,
                job.id,
                started_at,
                clock.elapsed().as_millis() as u64,
                candidates,
                evaluations,
            );
            info!(
                successful,
                failed = summary.failed,
                average_score = summary.average_score,
                "Batch completed"
            );
            summary
        }
        .instrument(span)
        .await
    }

    /// Canonical form of `dir` (relative paths start at the intake directory).
    async fn resolve_directory(&self, dir: &Path) -> Result<PathBuf, BatchError> {
        let root = tokio::fs::canonicalize(&self.intake_dir)
            .await
            .map_err(|source| BatchError::IntakeDirUnavailable {
                path: self.intake_dir.clone(),
                source,
            })?;
        let resolved = tokio::fs::canonicalize(self.intake_dir.join(dir))
            .await
            .map_err(|_| BatchError::DirectoryNotFound(dir.to_path_buf()))?;
        if !resolved.starts_with(&root) {
            return Err(BatchError::OutsideIntakeDir(dir.to_path_buf()));
        }
        Ok(resolved)
    }

    /// Phase 1: one task per submission, at most `max_concurrent` inside Graph 1.
    /// Results come back in submission order.
    async fn extract_all(
        &self,
        submissions: Vec<CandidateSubmission>,
        batch_id: Uuid,
        max_concurrent: usize,
    ) -> Vec<TaskResult> {
        let semaphore = Arc::new(Semaphore::new(max_concurrent));
        let mut tasks = JoinSet::new();
        let mut slots: Vec<Option<TaskResult>> = Vec::with_capacity(submissions.len());
        let mut fallbacks = Vec::with_capacity(submissions.len());

        for (index, submission) in submissions.into_iter().enumerate() {
            slots.push(None);
            fallbacks.push(submission.clone());
            let semaphore = semaphore.clone();
            let extraction = self.extraction.clone();
            let intake_dir = self.intake_dir.clone();

            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        let error = format!("Concurrency limiter closed: {e}");
                        return (index, TaskResult::failed(index, &submission, error));
                    }
                };
                let work =
                    process_submission(&extraction, &intake_dir, index, &submission, batch_id);
                let result = AssertUnwindSafe(work)
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| {
                        let error = format!("Task panicked: {}", panic_message(&*panic));
                        error!(index, "{error}");
                        TaskResult::failed(index, &submission, error)
                    });
                (index, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => error!("Batch task did not complete: {e}"),
            }
        }

        slots
            .into_iter()
            .zip(fallbacks)
            .enumerate()
            .map(|(index, (slot, submission))| {
                slot.unwrap_or_else(|| {
                    TaskResult::failed(index, &submission, "Task did not complete".to_string())
                })
            })
            .collect()
    }

    /// Phase 2: sequential evaluation of every persisted candidate.
    async fn evaluate_successful(
        &self,
        results: &[TaskResult],
        job: &JobPosting,
    ) -> Vec<EvaluationOutcome> {
        let mut evaluations = Vec::new();
        for record in results.iter().filter_map(|r| r.record.as_ref()) {
            if !record.is_evaluable() {
                continue;
            }
            let outcome = match self.ranking.evaluate_and_store(job, record).await {
                Ok((state, stored)) => EvaluationOutcome {
                    candidate_id: record.id,
                    candidate_name: record.candidate_name.clone(),
                    score: stored.score,
                    tag: stored.tag,
                    notify_hr: state.notify_hr,
                    error: None,
                },
                Err(e) => {
                    warn!(candidate_id = %record.id, "Batch evaluation not stored: {e}");
                    EvaluationOutcome {
                        candidate_id: record.id,
                        candidate_name: record.candidate_name.clone(),
                        score: None,
                        tag: None,
                        notify_hr: false,
                        error: Some(e.to_string()),
                    }
                }
            };
            evaluations.push(outcome);
        }
        evaluations
    }
}

async fn process_submission(
    extraction: &ExtractionPipeline,
    intake_dir: &Path,
    index: usize,
    submission: &CandidateSubmission,
    batch_id: Uuid,
) -> TaskResult {
    let path = match admit(intake_dir, &submission.cv_file_path).await {
        Ok(path) => path,
        Err(error) => {
            warn!(index, "Submission rejected: {error}");
            return TaskResult::failed(index, submission, error);
        }
    };

    let started = Instant::now();
    let state = extraction
        .run_in_batch(submission.identity.clone(), &path.to_string_lossy(), batch_id)
        .await;
    let record = state.candidate_id.map(|id| state.to_record(id));

    TaskResult {
        outcome: CandidateOutcome {
            index,
            candidate_name: state.candidate_name.clone(),
            candidate_email: state.candidate_email.clone(),
            cv_file_path: state.cv_file_path.clone(),
            candidate_id: state.candidate_id,
            success: state.candidate_id.is_some(),
            errors: state.errors.as_slice().to_vec(),
            processing_time_ms: started.elapsed().as_millis() as u64,
        },
        record,
    }
}

/// Admission check for one submitted path. Relative paths start at the intake
/// directory; the canonical file must be a supported CV inside it.
async fn admit(intake_dir: &Path, raw: &str) -> Result<PathBuf, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("No CV file path provided".to_string());
    }
    let requested = intake_dir.join(raw);
    if !is_supported(&requested) {
        return Err(format!("Unsupported CV file type: {raw}"));
    }

    let root = tokio::fs::canonicalize(intake_dir)
        .await
        .map_err(|e| format!("CV intake directory {} is unavailable: {e}", intake_dir.display()))?;
    let resolved = tokio::fs::canonicalize(&requested)
        .await
        .map_err(|_| format!("CV file not found: {raw}"))?;
    if !resolved.starts_with(&root) {
        return Err(format!("CV file is outside the intake directory: {raw}"));
    }
    // A supported name can still be a symlink to something else.
    if !is_supported(&resolved) {
        return Err(format!("Unsupported CV file type: {raw}"));
    }
    Ok(resolved)
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

fn validate_concurrency(max_concurrent: usize) -> Result<(), BatchError> {
    if (MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&max_concurrent) {
        Ok(())
    } else {
        Err(BatchError::InvalidConcurrency(max_concurrent))
    }
}

fn summarize(
    batch_id: Uuid,
    job_id: Uuid,
    started_at: DateTime<Utc>,
    total_processing_time_ms: u64,
    candidates: Vec<CandidateOutcome>,
    evaluations: Vec<EvaluationOutcome>,
) -> BatchSummary {
    let successful = candidates.iter().filter(|c| c.success).count();
    let scores: Vec<u8> = evaluations.iter().filter_map(|e| e.score).collect();
    let average_score = if scores.is_empty() {
        0.0
    } else {
        scores.iter().map(|&s| f64::from(s)).sum::<f64>() / scores.len() as f64
    };
    let average_processing_time_ms = if candidates.is_empty() {
        0.0
    } else {
        candidates
            .iter()
            .map(|c| c.processing_time_ms as f64)
            .sum::<f64>()
            / candidates.len() as f64
    };

    BatchSummary {
        batch_id,
        job_id,
        total: candidates.len(),
        successful,
        failed: candidates.len() - successful,
        average_score,
        highest_score: scores.iter().copied().max().unwrap_or(0),
        lowest_score: scores.iter().copied().min().unwrap_or(0),
        total_processing_time_ms,
        average_processing_time_ms,
        started_at,
        completed_at: Utc::now(),
        candidates,
        evaluations,
    }
}

/// Submissions for every supported file in `dir`, identities derived from file names.
pub async fn submissions_from_directory(
    dir: &Path,
) -> Result<Vec<CandidateSubmission>, BatchError> {
    if !tokio::fs::metadata(dir)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
    {
        return Err(BatchError::DirectoryNotFound(dir.to_path_buf()));
    }

    let read_error = |source| BatchError::ReadDirectory {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = tokio::fs::read_dir(dir).await.map_err(read_error)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_error)? {
        let path = entry.path();
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        if is_file && is_supported(&path) {
            files.push(path);
        }
    }
    if files.is_empty() {
        return Err(BatchError::NoCvFiles(dir.to_path_buf()));
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(files.iter().map(|path| submission_from_path(path)).collect())
}

/// `ada_lovelace.pdf` → name "ada lovelace", email "ada.lovelace@example.com".
fn submission_from_path(path: &Path) -> CandidateSubmission {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let name = stem.replace(['_', '-'], " ").trim().to_string();
    let email = format!(
        "{}@example.com",
        name.to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(".")
    );
    CandidateSubmission {
        identity: CandidateIdentity {
            name,
            email,
            ..Default::default()
        },
        cv_file_path: path.to_string_lossy().into_owned(),
    }
}
