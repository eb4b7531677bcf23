//! Typed per-run state threaded through pipeline nodes.
//!
//! Each node takes the state by value and hands it back. The error log can be
//! appended to but never cleared.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use tracing::error;
use uuid::Uuid;

use crate::models::candidate::{CandidateIdentity, CandidateRecord, ExtractedCv};
use crate::models::evaluation::{
    CandidateEvaluation, EvaluationRecord, EvaluationSource, JobSkills, SkillsMatch, Tag,
};
use crate::models::job::JobPosting;

/// Append-only list of degradation messages accumulated during a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorLog(Vec<String>);

impl ErrorLog {
    /// Records a message and emits it as an error event.
    pub fn record(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!("{message}");
        self.0.push(message);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    #[cfg(test)]
    pub fn contains(&self, needle: &str) -> bool {
        self.0.iter().any(|m| m.contains(needle))
    }
}

impl Serialize for ErrorLog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

/// Graph 1 state: one CV from upload to persisted candidate.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionState {
    pub candidate_name: String,
    pub candidate_email: String,
    pub user_id: Option<String>,
    pub user_email: Option<String>,
    pub cv_file_path: String,
    pub cv_object_name: String,
    /// Time-limited URL for the stored CV; empty when upload failed.
    pub cv_link: String,
    pub extracted_cv_data: ExtractedCv,
    pub summary: String,
    pub batch_id: Option<Uuid>,
    pub candidate_id: Option<Uuid>,
    pub errors: ErrorLog,
    pub timestamp: DateTime<Utc>,
}

impl ExtractionState {
    pub fn new(identity: CandidateIdentity, cv_file_path: impl Into<String>) -> Self {
        Self {
            candidate_name: identity.name,
            candidate_email: identity.email,
            user_id: identity.user_id,
            user_email: identity.user_email,
            cv_file_path: cv_file_path.into(),
            cv_object_name: String::new(),
            cv_link: String::new(),
            extracted_cv_data: ExtractedCv::default(),
            summary: String::new(),
            batch_id: None,
            candidate_id: None,
            errors: ErrorLog::default(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_batch(mut self, batch_id: Uuid) -> Self {
        self.batch_id = Some(batch_id);
        self
    }

    /// The document the persist node writes.
    pub fn to_record(&self, id: Uuid) -> CandidateRecord {
        CandidateRecord {
            id,
            user_id: self.user_id.clone(),
            user_email: self.user_email.clone(),
            candidate_name: self.candidate_name.clone(),
            candidate_email: self.candidate_email.clone(),
            cv_object_name: self.cv_object_name.clone(),
            cv_link: self.cv_link.clone(),
            extracted_cv_data: self.extracted_cv_data.clone(),
            summary: self.summary.clone(),
            batch_id: self.batch_id,
            errors: self.errors.as_slice().to_vec(),
            created_at: self.timestamp,
        }
    }
}

/// Graph 2 state: one job against one stored candidate.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationState {
    pub job_id: Uuid,
    pub job_title: String,
    pub job_description: String,
    pub hr_email: String,
    pub job_skills: JobSkills,
    pub candidate_id: Uuid,
    pub candidate_name: String,
    pub candidate_email: String,
    pub summary: String,
    pub extracted_cv_data: ExtractedCv,
    pub cv_link: String,
    pub evaluation: CandidateEvaluation,
    pub evaluation_score: u8,
    pub evaluation_source: EvaluationSource,
    /// Scorer invocations made by the scoring node (0 when scoring was skipped).
    pub scoring_attempts: u32,
    pub skills_match: SkillsMatch,
    pub tag: Option<Tag>,
    pub notify_hr: bool,
    pub notification_message: String,
    pub errors: ErrorLog,
    pub timestamp: DateTime<Utc>,
}

impl EvaluationState {
    pub fn new(job: &JobPosting, candidate: &CandidateRecord) -> Self {
        Self {
            job_id: job.id,
            job_title: job.title.clone(),
            job_description: job.description.clone(),
            hr_email: job.hr_email.clone(),
            job_skills: JobSkills::default(),
            candidate_id: candidate.id,
            candidate_name: candidate.candidate_name.clone(),
            candidate_email: candidate.candidate_email.clone(),
            summary: candidate.summary.clone(),
            extracted_cv_data: candidate.extracted_cv_data.clone(),
            cv_link: candidate.cv_link.clone(),
            evaluation: CandidateEvaluation::default(),
            evaluation_score: 0,
            evaluation_source: EvaluationSource::Default,
            scoring_attempts: 0,
            skills_match: SkillsMatch::default(),
            tag: None,
            notify_hr: false,
            notification_message: String::new(),
            errors: ErrorLog::default(),
            timestamp: Utc::now(),
        }
    }

    /// The ranking-store row for this run.
    pub fn to_record(&self) -> EvaluationRecord {
        EvaluationRecord {
            candidate_id: self.candidate_id,
            job_id: self.job_id,
            score: Some(self.evaluation_score),
            evaluation: self.evaluation.clone(),
            skills_match: self.skills_match.clone(),
            tag: self.tag,
            evaluated_at: self.timestamp,
        }
    }
}
