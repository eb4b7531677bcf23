//! Stub collaborators shared by unit tests.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::documents::{DocumentError, DocumentTextExtractor};
use crate::evaluation::job_skills::JobSkillExtractor;
use crate::evaluation::notifications::{Notification, Notifier, NotifyError};
use crate::evaluation::scorer::{CandidateScorer, ScoreError};
use crate::extraction::fields::StructuredFieldExtractor;
use crate::llm_client::LlmError;
use crate::models::candidate::{CandidateRecord, ExtractedCv};
use crate::models::evaluation::{CandidateEvaluation, JobSkills};
use crate::repository::{CandidateRepository, RepositoryError};
use crate::storage::{ObjectStorage, StorageError, StoredObject};

pub fn evaluation_with_score(score: u8) -> CandidateEvaluation {
    CandidateEvaluation {
        score,
        reasoning: format!("Scored {score}"),
        strengths: vec!["Relevant experience".to_string()],
        gaps: vec![],
        decision: "hire".to_string(),
    }
}

pub fn candidate_record(name: &str, summary: &str) -> CandidateRecord {
    let mut extracted = ExtractedCv::default();
    extracted.personal_info.name = name.to_string();
    CandidateRecord {
        id: Uuid::new_v4(),
        user_id: None,
        user_email: None,
        candidate_name: name.to_string(),
        candidate_email: format!("{}@example.com", name.to_lowercase()),
        cv_object_name: String::new(),
        cv_link: String::new(),
        extracted_cv_data: extracted,
        summary: summary.to_string(),
        batch_id: None,
        errors: vec![],
        created_at: Utc::now(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Documents and fields
// ────────────────────────────────────────────────────────────────────────────

/// Reads any existing file as UTF-8 text, whatever its extension.
pub struct StubTextExtractor;

impl StubTextExtractor {
    pub fn reading_files() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentTextExtractor for StubTextExtractor {
    async fn extract_text(&self, path: &Path) -> Result<String, DocumentError> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|_| DocumentError::NotFound(path.to_path_buf()))
    }
}

pub struct StubFieldExtractor {
    cv: Option<ExtractedCv>,
}

impl StubFieldExtractor {
    pub fn returning(cv: ExtractedCv) -> Self {
        Self { cv: Some(cv) }
    }

    pub fn failing() -> Self {
        Self { cv: None }
    }
}

#[async_trait]
impl StructuredFieldExtractor for StubFieldExtractor {
    async fn extract_fields(&self, _text: &str) -> Result<ExtractedCv, LlmError> {
        self.cv.clone().ok_or(LlmError::EmptyContent)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Storage
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, Bytes>>,
}

impl MemoryStorage {
    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn upload(&self, bytes: Bytes, object_name: &str) -> Result<StoredObject, StorageError> {
        self.objects
            .lock()
            .await
            .insert(object_name.to_string(), bytes);
        Ok(StoredObject {
            object_name: object_name.to_string(),
            url: format!("memory://{object_name}?expires=24h"),
        })
    }

    async fn download(&self, object_name: &str) -> Result<Bytes, StorageError> {
        self.objects
            .lock()
            .await
            .get(object_name)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(object_name.to_string()))
    }

    async fn delete(&self, object_name: &str) -> Result<bool, StorageError> {
        Ok(self.objects.lock().await.remove(object_name).is_some())
    }
}

pub struct FailingStorage;

#[async_trait]
impl ObjectStorage for FailingStorage {
    async fn upload(&self, _bytes: Bytes, _object_name: &str) -> Result<StoredObject, StorageError> {
        Err(StorageError::S3("bucket unavailable".to_string()))
    }

    async fn download(&self, object_name: &str) -> Result<Bytes, StorageError> {
        Err(StorageError::NotFound(object_name.to_string()))
    }

    async fn delete(&self, _object_name: &str) -> Result<bool, StorageError> {
        Ok(false)
    }
}

/// Candidate store whose writes always fail.
pub struct FailingCandidateRepository;

#[async_trait]
impl CandidateRepository for FailingCandidateRepository {
    async fn insert(&self, _record: CandidateRecord) -> Result<Uuid, RepositoryError> {
        Err(RepositoryError::Corrupt("disk full".to_string()))
    }

    async fn get(&self, _id: Uuid) -> Result<Option<CandidateRecord>, RepositoryError> {
        Ok(None)
    }

    async fn find_by_email(&self, _email: &str) -> Result<Vec<CandidateRecord>, RepositoryError> {
        Ok(vec![])
    }

    async fn find_by_batch(&self, _batch_id: Uuid) -> Result<Vec<CandidateRecord>, RepositoryError> {
        Ok(vec![])
    }

    async fn list(&self) -> Result<Vec<CandidateRecord>, RepositoryError> {
        Ok(vec![])
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Evaluation collaborators
// ────────────────────────────────────────────────────────────────────────────

pub struct StubJobSkillExtractor {
    skills: Option<JobSkills>,
}

impl StubJobSkillExtractor {
    pub fn returning(skills: JobSkills) -> Self {
        Self {
            skills: Some(skills),
        }
    }

    pub fn failing() -> Self {
        Self { skills: None }
    }
}

#[async_trait]
impl JobSkillExtractor for StubJobSkillExtractor {
    async fn extract_skills(&self, _job_description: &str) -> Result<JobSkills, LlmError> {
        self.skills.clone().ok_or(LlmError::Api {
            status: 503,
            message: "overloaded".to_string(),
        })
    }
}

/// Plays back scripted results in order, then keeps answering with `fallback_score`.
pub struct ScriptedScorer {
    script: Mutex<VecDeque<Result<CandidateEvaluation, ScoreError>>>,
    fallback_score: u8,
    calls: AtomicUsize,
}

impl ScriptedScorer {
    pub fn new(script: Vec<Result<CandidateEvaluation, ScoreError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback_score: 60,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always(score: u8) -> Self {
        Self {
            fallback_score: score,
            ..Self::new(vec![])
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CandidateScorer for ScriptedScorer {
    async fn score(
        &self,
        _summary: &str,
        _job_description: &str,
    ) -> Result<CandidateEvaluation, ScoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(evaluation_with_score(self.fallback_score)))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn channel(&self) -> &'static str {
        "recording"
    }

    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent.lock().await.push(notification.clone());
        Ok(())
    }
}

pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    fn channel(&self) -> &'static str {
        "webhook"
    }

    async fn notify(&self, _notification: &Notification) -> Result<(), NotifyError> {
        Err(NotifyError::Delivery {
            channel: self.channel(),
            message: "connection refused".to_string(),
        })
    }
}
