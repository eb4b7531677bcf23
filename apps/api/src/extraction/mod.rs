//! Graph 1: upload → extract → summarize → persist.
//!
//! Every node degrades instead of failing. A run always returns its state; the
//! caller checks `candidate_id` and `errors` to see how far it got.

pub mod fields;
pub mod handlers;
pub mod prompts;
pub mod summary;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::documents::{is_supported, DocumentTextExtractor};
use crate::extraction::fields::{
    fallback_extraction, StructuredFieldExtractor, UNKNOWN_EMAIL, UNKNOWN_NAME,
};
use crate::extraction::summary::compose_summary;
use crate::models::candidate::CandidateIdentity;
use crate::pipeline::node::{run_sequence, NodeSequence};
use crate::pipeline::state::ExtractionState;
use crate::repository::CandidateRepository;
use crate::storage::ObjectStorage;

/// Folder prefix for uploaded CV objects.
const CV_FOLDER: &str = "cvs";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionNode {
    Upload,
    Extract,
    Summarize,
    Persist,
}

const EXTRACTION_SEQUENCE: &[ExtractionNode] = &[
    ExtractionNode::Upload,
    ExtractionNode::Extract,
    ExtractionNode::Summarize,
    ExtractionNode::Persist,
];

pub struct ExtractionPipeline {
    storage: Arc<dyn ObjectStorage>,
    documents: Arc<dyn DocumentTextExtractor>,
    fields: Arc<dyn StructuredFieldExtractor>,
    /// `None` leaves runs unpersisted, with an error recorded.
    repository: Option<Arc<dyn CandidateRepository>>,
}

impl ExtractionPipeline {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        documents: Arc<dyn DocumentTextExtractor>,
        fields: Arc<dyn StructuredFieldExtractor>,
        repository: Option<Arc<dyn CandidateRepository>>,
    ) -> Self {
        Self {
            storage,
            documents,
            fields,
            repository,
        }
    }

    pub async fn run(&self, identity: CandidateIdentity, cv_file_path: &str) -> ExtractionState {
        self.run_state(ExtractionState::new(identity, cv_file_path))
            .await
    }

    /// Same as [`run`](Self::run), tagging the persisted record with `batch_id`.
    pub async fn run_in_batch(
        &self,
        identity: CandidateIdentity,
        cv_file_path: &str,
        batch_id: Uuid,
    ) -> ExtractionState {
        self.run_state(ExtractionState::new(identity, cv_file_path).with_batch(batch_id))
            .await
    }

    async fn run_state(&self, state: ExtractionState) -> ExtractionState {
        let span = info_span!(
            "extraction",
            cv_file_path = %state.cv_file_path,
            batch_id = ?state.batch_id
        );
        async move {
            let state = run_sequence(self, state).await;
            if state.errors.is_empty() {
                info!(candidate_id = ?state.candidate_id, "CV processing completed");
            } else {
                warn!(
                    candidate_id = ?state.candidate_id,
                    errors = state.errors.len(),
                    "CV processing completed with errors"
                );
            }
            state
        }
        .instrument(span)
        .await
    }

    async fn upload(&self, mut state: ExtractionState) -> ExtractionState {
        if state.cv_file_path.trim().is_empty() {
            state.errors.record("No CV file path provided");
            return state;
        }

        let path = Path::new(&state.cv_file_path);
        if !is_supported(path) {
            state.errors.record(format!(
                "Upload skipped: unsupported CV file type {}",
                path.display()
            ));
            return state;
        }
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => Bytes::from(bytes),
            Err(e) => {
                state
                    .errors
                    .record(format!("Upload failed: cannot read {}: {e}", path.display()));
                return state;
            }
        };

        let object_name = object_name_for(&state.candidate_name, path);
        match self.storage.upload(bytes, &object_name).await {
            Ok(stored) => {
                info!("CV uploaded as {}", stored.object_name);
                state.cv_object_name = stored.object_name;
                state.cv_link = stored.url;
            }
            Err(e) => state.errors.record(format!("Upload failed: {e}")),
        }
        state
    }

    async fn extract(&self, mut state: ExtractionState) -> ExtractionState {
        let readable = is_supported(Path::new(&state.cv_file_path));
        let text = if state.cv_file_path.trim().is_empty() || !readable {
            String::new()
        } else {
            match self
                .documents
                .extract_text(Path::new(&state.cv_file_path))
                .await
            {
                Ok(text) => {
                    if text.trim().is_empty() {
                        state.errors.record("CV file produced no text");
                    }
                    text
                }
                Err(e) => {
                    state.errors.record(format!("CV text extraction failed: {e}"));
                    String::new()
                }
            }
        };

        state.extracted_cv_data = if text.trim().is_empty() {
            fallback_extraction(&text)
        } else {
            match self.fields.extract_fields(&text).await {
                Ok(cv) => cv,
                Err(e) => {
                    state.errors.record(format!("CV field extraction failed: {e}"));
                    fallback_extraction(&text)
                }
            }
        };

        let info = &state.extracted_cv_data.personal_info;
        if state.candidate_name.trim().is_empty() {
            state.candidate_name = non_empty_or(&info.name, UNKNOWN_NAME);
        }
        if state.candidate_email.trim().is_empty() {
            state.candidate_email = non_empty_or(&info.email, UNKNOWN_EMAIL);
        }
        state
    }

    async fn summarize(&self, mut state: ExtractionState) -> ExtractionState {
        state.summary = compose_summary(&state.candidate_name, &state.extracted_cv_data);
        state
    }

    async fn persist(&self, mut state: ExtractionState) -> ExtractionState {
        let Some(repository) = &self.repository else {
            state
                .errors
                .record("No candidate repository configured; candidate not saved");
            return state;
        };

        let id = Uuid::new_v4();
        match repository.insert(state.to_record(id)).await {
            Ok(id) => {
                info!(candidate_id = %id, "Candidate saved");
                state.candidate_id = Some(id);
            }
            Err(e) => {
                state.errors.record(format!("Failed to save candidate: {e}"));
                self.discard_upload(&mut state).await;
            }
        }
        state
    }

    /// Removes the stored CV of a candidate that was never saved.
    async fn discard_upload(&self, state: &mut ExtractionState) {
        if state.cv_object_name.is_empty() {
            return;
        }
        match self.storage.delete(&state.cv_object_name).await {
            Ok(_) => {
                info!(object = %state.cv_object_name, "Discarded orphaned CV upload");
                state.cv_object_name.clear();
                state.cv_link.clear();
            }
            Err(e) => warn!(object = %state.cv_object_name, "Could not discard CV upload: {e}"),
        }
    }
}

#[async_trait]
impl NodeSequence for ExtractionPipeline {
    type State = ExtractionState;
    type Node = ExtractionNode;

    fn sequence(&self) -> &'static [ExtractionNode] {
        EXTRACTION_SEQUENCE
    }

    fn node_name(node: ExtractionNode) -> &'static str {
        match node {
            ExtractionNode::Upload => "upload",
            ExtractionNode::Extract => "extract",
            ExtractionNode::Summarize => "summarize",
            ExtractionNode::Persist => "persist",
        }
    }

    async fn execute(&self, node: ExtractionNode, state: ExtractionState) -> ExtractionState {
        match node {
            ExtractionNode::Upload => self.upload(state).await,
            ExtractionNode::Extract => self.extract(state).await,
            ExtractionNode::Summarize => self.summarize(state).await,
            ExtractionNode::Persist => self.persist(state).await,
        }
    }
}

/// `cvs/<uuid>_<Name_With_Underscores>_resume.<ext>`; the uuid keeps re-uploads apart.
fn object_name_for(candidate_name: &str, path: &Path) -> String {
    let name = candidate_name.trim();
    let name = if name.is_empty() {
        "candidate".to_string()
    } else {
        name.split_whitespace().collect::<Vec<_>>().join("_")
    };
    let name: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_else(|| "pdf".to_string());
    format!("{CV_FOLDER}/{}_{name}_resume.{extension}", Uuid::new_v4())
}

fn non_empty_or(value: &str, placeholder: &str) -> String {
    if value.trim().is_empty() {
        placeholder.to_string()
    } else {
        value.trim().to_string()
    }
}
