use std::sync::Arc;

use crate::batch::BatchCoordinator;
use crate::config::Config;
use crate::documents::DocumentTextExtractor;
use crate::evaluation::job_skills::JobSkillExtractor;
use crate::evaluation::notifications::Notifier;
use crate::evaluation::scorer::CandidateScorer;
use crate::evaluation::EvaluationPipeline;
use crate::extraction::fields::StructuredFieldExtractor;
use crate::extraction::ExtractionPipeline;
use crate::ranking::RankingService;
use crate::repository::{CandidateRepository, EvaluationRepository, JobRepository};
use crate::storage::ObjectStorage;

/// Persistence backends, Postgres or in-memory.
#[derive(Clone)]
pub struct Repositories {
    pub candidates: Arc<dyn CandidateRepository>,
    pub jobs: Arc<dyn JobRepository>,
    pub evaluations: Arc<dyn EvaluationRepository>,
}

/// External collaborators the two pipelines call out to.
pub struct Collaborators {
    pub storage: Arc<dyn ObjectStorage>,
    pub documents: Arc<dyn DocumentTextExtractor>,
    pub fields: Arc<dyn StructuredFieldExtractor>,
    pub job_skills: Arc<dyn JobSkillExtractor>,
    pub scorer: Arc<dyn CandidateScorer>,
    pub notifiers: Vec<Arc<dyn Notifier>>,
}

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub candidates: Arc<dyn CandidateRepository>,
    pub jobs: Arc<dyn JobRepository>,
    pub evaluations: Arc<dyn EvaluationRepository>,
    pub storage: Arc<dyn ObjectStorage>,
    pub extraction: Arc<ExtractionPipeline>,
    pub ranking: Arc<RankingService>,
    pub batches: Arc<BatchCoordinator>,
}

impl AppState {
    /// Wires both pipelines, the ranking service and the batch coordinator.
    pub fn new(config: Config, repositories: Repositories, collaborators: Collaborators) -> Self {
        let extraction = Arc::new(ExtractionPipeline::new(
            collaborators.storage.clone(),
            collaborators.documents,
            collaborators.fields,
            Some(repositories.candidates.clone()),
        ));
        let evaluation = Arc::new(EvaluationPipeline::new(
            collaborators.job_skills,
            collaborators.scorer,
            collaborators.notifiers,
            config.thresholds,
        ));
        let ranking = Arc::new(RankingService::new(
            repositories.candidates.clone(),
            repositories.jobs.clone(),
            repositories.evaluations.clone(),
            evaluation,
        ));
        let batches = Arc::new(BatchCoordinator::new(
            extraction.clone(),
            ranking.clone(),
            config.cv_intake_dir.clone(),
        ));

        Self {
            config: Arc::new(config),
            candidates: repositories.candidates,
            jobs: repositories.jobs,
            evaluations: repositories.evaluations,
            storage: collaborators.storage,
            extraction,
            ranking,
            batches,
        }
    }
}
