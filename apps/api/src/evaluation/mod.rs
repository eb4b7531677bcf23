//! Graph 2: extract job skills → score → match skills → decide → [notify | end].
//!
//! Scoring is the only node that retries. Whatever happens, a run ends with a
//! usable score and a tag.

pub mod decision;
pub mod fallback;
pub mod handlers;
pub mod job_skills;
pub mod notifications;
pub mod prompts;
pub mod scorer;
pub mod skills_match;

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{info, info_span, Instrument};

use crate::evaluation::decision::{decide, DecisionThresholds};
use crate::evaluation::fallback::parse_evaluation_fallback;
use crate::evaluation::job_skills::JobSkillExtractor;
use crate::evaluation::notifications::{Notification, Notifier};
use crate::evaluation::scorer::{CandidateScorer, ScoreError};
use crate::evaluation::skills_match::match_skills;
use crate::models::candidate::CandidateRecord;
use crate::models::evaluation::{CandidateEvaluation, EvaluationSource};
use crate::models::job::JobPosting;
use crate::pipeline::node::{run_sequence, with_retry, NodeSequence, RetryOutcome};
use crate::pipeline::state::EvaluationState;

/// One call plus one retry.
pub const SCORING_MAX_ATTEMPTS: u32 = 2;

pub const INSUFFICIENT_DATA_REASONING: &str = "Insufficient data for evaluation";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationNode {
    ExtractJobSkills,
    Score,
    MatchSkills,
    Decide,
    /// Conditional branch after `Decide`; never part of the static sequence.
    Notify,
}

const EVALUATION_SEQUENCE: &[EvaluationNode] = &[
    EvaluationNode::ExtractJobSkills,
    EvaluationNode::Score,
    EvaluationNode::MatchSkills,
    EvaluationNode::Decide,
];

pub struct EvaluationPipeline {
    job_skills: Arc<dyn JobSkillExtractor>,
    scorer: Arc<dyn CandidateScorer>,
    notifiers: Vec<Arc<dyn Notifier>>,
    thresholds: DecisionThresholds,
}

impl EvaluationPipeline {
    pub fn new(
        job_skills: Arc<dyn JobSkillExtractor>,
        scorer: Arc<dyn CandidateScorer>,
        notifiers: Vec<Arc<dyn Notifier>>,
        thresholds: DecisionThresholds,
    ) -> Self {
        Self {
            job_skills,
            scorer,
            notifiers,
            thresholds,
        }
    }

    pub async fn run(&self, job: &JobPosting, candidate: &CandidateRecord) -> EvaluationState {
        let span = info_span!("evaluation", job_id = %job.id, candidate_id = %candidate.id);
        async move {
            let mut state = run_sequence(self, EvaluationState::new(job, candidate)).await;
            if state.notify_hr {
                state = self.execute(EvaluationNode::Notify, state).await;
            }
            info!(
                score = state.evaluation_score,
                source = ?state.evaluation_source,
                tag = ?state.tag,
                "Evaluation completed"
            );
            state
        }
        .instrument(span)
        .await
    }

    async fn extract_job_skills(&self, mut state: EvaluationState) -> EvaluationState {
        if state.job_description.trim().is_empty() {
            state.errors.record("No job description provided");
            return state;
        }
        match self.job_skills.extract_skills(&state.job_description).await {
            Ok(skills) => {
                info!("Job skills extracted: {} technical", skills.tech_skills.len());
                state.job_skills = skills;
            }
            Err(e) => state.errors.record(format!("Job skills extraction error: {e}")),
        }
        state
    }

    async fn score(&self, mut state: EvaluationState) -> EvaluationState {
        if state.summary.trim().is_empty() || state.job_description.trim().is_empty() {
            state.errors.record(format!(
                "{INSUFFICIENT_DATA_REASONING}: candidate summary or job description is empty"
            ));
            state.evaluation = CandidateEvaluation::neutral(INSUFFICIENT_DATA_REASONING);
            state.evaluation_score = state.evaluation.score;
            state.evaluation_source = EvaluationSource::Default;
            return state;
        }

        let outcome = with_retry("score", SCORING_MAX_ATTEMPTS, |_| {
            self.scorer.score(&state.summary, &state.job_description)
        })
        .await;
        state.scoring_attempts = outcome.attempts();

        let (evaluation, source) = match outcome {
            RetryOutcome::Succeeded { value, .. } => (value, EvaluationSource::Model),
            RetryOutcome::Exhausted {
                error: ScoreError::Parse { raw, reason },
                attempts,
            } => {
                state.errors.record(format!(
                    "Evaluation output invalid after {attempts} attempts ({reason}); used fallback parser"
                ));
                (
                    parse_evaluation_fallback(&raw),
                    EvaluationSource::FallbackParser,
                )
            }
            RetryOutcome::Exhausted {
                error: ScoreError::Provider(message),
                ..
            } => {
                state.errors.record(format!("Evaluation error: {message}"));
                (
                    CandidateEvaluation::neutral(format!("Evaluation failed: {message}")),
                    EvaluationSource::Default,
                )
            }
        };

        state.evaluation_score = evaluation.score;
        state.evaluation = evaluation;
        state.evaluation_source = source;
        state
    }

    async fn match_candidate_skills(&self, mut state: EvaluationState) -> EvaluationState {
        state.skills_match = match_skills(
            &state.job_skills.tech_skills,
            &state.extracted_cv_data.matchable_skills(),
        );
        state
    }

    async fn apply_decision(&self, mut state: EvaluationState) -> EvaluationState {
        let decision = decide(state.evaluation_score, &self.thresholds);
        state.tag = Some(decision.tag);
        state.notify_hr = decision.notify_hr;
        state.notification_message = decision.message;
        state
    }

    async fn notify(&self, mut state: EvaluationState) -> EvaluationState {
        let Some(tag) = state.tag else {
            return state;
        };
        let notification = Notification {
            recipient: state.hr_email.clone(),
            job_id: state.job_id,
            job_title: state.job_title.clone(),
            candidate_id: state.candidate_id,
            candidate_name: state.candidate_name.clone(),
            candidate_email: state.candidate_email.clone(),
            score: state.evaluation_score,
            tag,
            message: state.notification_message.clone(),
            cv_link: state.cv_link.clone(),
        };

        let results = join_all(self.notifiers.iter().map(|n| n.notify(&notification))).await;
        for (notifier, result) in self.notifiers.iter().zip(results) {
            match result {
                Ok(()) => info!(channel = notifier.channel(), "HR notified"),
                Err(e) => state.errors.record(e.to_string()),
            }
        }
        state
    }
}

#[async_trait]
impl NodeSequence for EvaluationPipeline {
    type State = EvaluationState;
    type Node = EvaluationNode;

    fn sequence(&self) -> &'static [EvaluationNode] {
        EVALUATION_SEQUENCE
    }

    fn node_name(node: EvaluationNode) -> &'static str {
        match node {
            EvaluationNode::ExtractJobSkills => "extract_job_skills",
            EvaluationNode::Score => "score",
            EvaluationNode::MatchSkills => "match_skills",
            EvaluationNode::Decide => "decide",
            EvaluationNode::Notify => "notify",
        }
    }

    async fn execute(&self, node: EvaluationNode, state: EvaluationState) -> EvaluationState {
        match node {
            EvaluationNode::ExtractJobSkills => self.extract_job_skills(state).await,
            EvaluationNode::Score => self.score(state).await,
            EvaluationNode::MatchSkills => self.match_candidate_skills(state).await,
            EvaluationNode::Decide => self.apply_decision(state).await,
            EvaluationNode::Notify => self.notify(state).await,
        }
    }
}
