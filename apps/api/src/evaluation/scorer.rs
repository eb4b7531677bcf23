//! Candidate scorer: one model call per attempt, parsed into the
//! `CandidateEvaluation` shape. Out-of-range scores are clamped, not rejected.

use async_trait::async_trait;
use thiserror::Error;

use crate::evaluation::prompts::{EVALUATION_PROMPT_TEMPLATE, EVALUATION_SYSTEM};
use crate::llm_client::prompts::fill_template;
use crate::llm_client::{parse_json_output, LlmClient, LlmError};
use crate::models::evaluation::{truncate_chars, CandidateEvaluation, MAX_REASONING_CHARS};

#[derive(Debug, Error)]
pub enum ScoreError {
    /// The model answered but the text is not a valid evaluation. `raw` is kept
    /// for the fallback parser.
    #[error("Invalid json output: {reason}")]
    Parse { raw: String, reason: String },

    #[error("Scoring provider error: {0}")]
    Provider(String),
}

impl From<LlmError> for ScoreError {
    fn from(error: LlmError) -> Self {
        match error {
            LlmError::Parse { source, raw } => ScoreError::Parse {
                raw,
                reason: source.to_string(),
            },
            other => ScoreError::Provider(other.to_string()),
        }
    }
}

#[async_trait]
pub trait CandidateScorer: Send + Sync {
    async fn score(
        &self,
        summary: &str,
        job_description: &str,
    ) -> Result<CandidateEvaluation, ScoreError>;
}

pub struct LlmCandidateScorer {
    llm: LlmClient,
}

impl LlmCandidateScorer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl CandidateScorer for LlmCandidateScorer {
    async fn score(
        &self,
        summary: &str,
        job_description: &str,
    ) -> Result<CandidateEvaluation, ScoreError> {
        let prompt = fill_template(
            EVALUATION_PROMPT_TEMPLATE,
            &[("summary", summary), ("job_description", job_description)],
        );
        let text = self.llm.call_text(&prompt, EVALUATION_SYSTEM).await?;
        parse_evaluation(&text)
    }
}

/// Parses model text as an evaluation.
pub fn parse_evaluation(text: &str) -> Result<CandidateEvaluation, ScoreError> {
    let mut evaluation: CandidateEvaluation = parse_json_output(text)?;
    evaluation.reasoning = truncate_chars(&evaluation.reasoning, MAX_REASONING_CHARS);
    Ok(evaluation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_json_evaluation_parses() {
        let text = r#"{"score": 83, "reasoning": "Deep Rust background", "strengths": ["Rust"], "gaps": [], "decision": "hire"}"#;
        let evaluation = parse_evaluation(text).unwrap();
        assert_eq!(evaluation.score, 83);
        assert_eq!(evaluation.strengths, vec!["Rust"]);
        assert_eq!(evaluation.decision, "hire");
    }

    #[test]
    fn test_prose_output_is_parse_error_with_raw_text() {
        let text = "**Score: 72/100**\n**Reasoning:** Solid.";
        match parse_evaluation(text).unwrap_err() {
            ScoreError::Parse { raw, .. } => assert_eq!(raw, text),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_out_of_range_score_is_clamped() {
        let evaluation = parse_evaluation(r#"{"score": 140, "reasoning": "great"}"#).unwrap();
        assert_eq!(evaluation.score, 100);
        assert_eq!(evaluation.reasoning, "great");
        let evaluation = parse_evaluation(r#"{"score": 0, "reasoning": "n/a"}"#).unwrap();
        assert_eq!(evaluation.score, 1);
    }

    #[test]
    fn test_json_without_reasoning_keeps_model_score() {
        let evaluation =
            parse_evaluation(r#"{"score": 85, "strengths": ["Rust", "Postgres"]}"#).unwrap();
        assert_eq!(evaluation.score, 85);
        assert!(evaluation.reasoning.is_empty());
        assert_eq!(evaluation.strengths, vec!["Rust", "Postgres"]);
    }

    #[test]
    fn test_missing_score_is_parse_error() {
        assert!(matches!(
            parse_evaluation(r#"{"reasoning": "no number"}"#),
            Err(ScoreError::Parse { .. })
        ));
    }

    #[test]
    fn test_long_reasoning_is_truncated() {
        let text = format!(r#"{{"score": 60, "reasoning": "{}"}}"#, "r".repeat(3000));
        let evaluation = parse_evaluation(&text).unwrap();
        assert_eq!(evaluation.reasoning.chars().count(), MAX_REASONING_CHARS);
    }

    #[test]
    fn test_transport_errors_map_to_provider() {
        let error = ScoreError::from(LlmError::EmptyContent);
        assert!(matches!(error, ScoreError::Provider(_)));
    }
}
