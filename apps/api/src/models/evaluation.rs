use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Longest reasoning text kept on an evaluation.
pub const MAX_REASONING_CHARS: usize = 2000;

/// Score assigned when no usable score could be obtained.
pub const DEFAULT_SCORE: u8 = 50;

/// Skills required by a job, as canonical short names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobSkills {
    pub tech_skills: Vec<String>,
    pub soft_skills: Vec<String>,
}

/// Model judgement of one candidate against one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateEvaluation {
    #[serde(deserialize_with = "deserialize_clamped_score")]
    pub score: u8,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub gaps: Vec<String>,
    #[serde(default)]
    pub decision: String,
}

impl CandidateEvaluation {
    /// Neutral evaluation used when scoring was skipped or failed outright.
    pub fn neutral(reasoning: impl Into<String>) -> Self {
        Self {
            score: DEFAULT_SCORE,
            reasoning: truncate_chars(&reasoning.into(), MAX_REASONING_CHARS),
            strengths: vec![],
            gaps: vec![],
            decision: "unknown".to_string(),
        }
    }
}

/// Accepts any JSON number and clamps it into 1..=100; fractional scores round.
fn deserialize_clamped_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let raw = f64::deserialize(deserializer)?;
    if raw.is_nan() {
        return Ok(DEFAULT_SCORE);
    }
    Ok(raw.round().clamp(1.0, 100.0) as u8)
}

impl Default for CandidateEvaluation {
    fn default() -> Self {
        Self {
            score: DEFAULT_SCORE,
            reasoning: String::new(),
            strengths: vec![],
            gaps: vec![],
            decision: String::new(),
        }
    }
}

/// How the evaluation on a run was obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationSource {
    Model,
    FallbackParser,
    #[default]
    Default,
}

/// Required job skills split by how well the candidate covers them.
/// `partial` is part of the stored shape but is never populated by exact matching.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillsMatch {
    pub strong: Vec<String>,
    pub partial: Vec<String>,
    pub missing: Vec<String>,
}

/// Coarse bucket derived from the evaluation score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    HighPotential,
    Moderate,
    LowPotential,
}

impl Tag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::HighPotential => "high_potential",
            Tag::Moderate => "moderate",
            Tag::LowPotential => "low_potential",
        }
    }

    pub fn parse(value: &str) -> Option<Tag> {
        match value {
            "high_potential" => Some(Tag::HighPotential),
            "moderate" => Some(Tag::Moderate),
            "low_potential" => Some(Tag::LowPotential),
            _ => None,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stored result per (candidate_id, job_id). Writes for an existing pair replace it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    pub score: Option<u8>,
    pub evaluation: CandidateEvaluation,
    pub skills_match: SkillsMatch,
    pub tag: Option<Tag>,
    pub evaluated_at: DateTime<Utc>,
}

pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&Tag::HighPotential).unwrap(),
            r#""high_potential""#
        );
        assert_eq!(Tag::parse("low_potential"), Some(Tag::LowPotential));
        assert_eq!(Tag::parse("error"), None);
    }

    #[test]
    fn test_out_of_range_scores_are_clamped() {
        let high: CandidateEvaluation =
            serde_json::from_str(r#"{"score": 140, "reasoning": "great"}"#).unwrap();
        assert_eq!(high.score, 100);
        let low: CandidateEvaluation = serde_json::from_str(r#"{"score": -3}"#).unwrap();
        assert_eq!(low.score, 1);
        let fractional: CandidateEvaluation = serde_json::from_str(r#"{"score": 84.6}"#).unwrap();
        assert_eq!(fractional.score, 85);
    }

    #[test]
    fn test_missing_reasoning_defaults_to_empty() {
        let evaluation: CandidateEvaluation =
            serde_json::from_str(r#"{"score": 85, "strengths": ["Rust"]}"#).unwrap();
        assert_eq!(evaluation.score, 85);
        assert_eq!(evaluation.reasoning, "");
        assert_eq!(evaluation.strengths, vec!["Rust"]);
    }

    #[test]
    fn test_evaluation_missing_lists_default_to_empty() {
        let json = r#"{"score": 81, "reasoning": "Solid backend experience"}"#;
        let evaluation: CandidateEvaluation = serde_json::from_str(json).unwrap();
        assert_eq!(evaluation.score, 81);
        assert!(evaluation.strengths.is_empty());
        assert!(evaluation.gaps.is_empty());
        assert_eq!(evaluation.decision, "");
    }

    #[test]
    fn test_neutral_evaluation_truncates_reasoning() {
        let evaluation = CandidateEvaluation::neutral("x".repeat(5000));
        assert_eq!(evaluation.reasoning.chars().count(), MAX_REASONING_CHARS);
        assert_eq!(evaluation.score, DEFAULT_SCORE);
    }
}
