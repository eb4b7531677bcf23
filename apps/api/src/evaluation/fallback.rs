//! Best-effort recovery of a score and reasoning from model text that failed
//! schema validation.
//!
//! The patterns are heuristics. They can pick up unrelated numbers such as
//! "10/100 tickets closed"; the tests below pin that behaviour.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::evaluation::{
    truncate_chars, CandidateEvaluation, DEFAULT_SCORE, MAX_REASONING_CHARS,
};

/// Score patterns in priority order.
static SCORE_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)\*\*Score:\s*(\d+)\s*/\s*100\*\*").expect("valid bold score regex"),
        Regex::new(r"(?i)Score:\s*(\d+)\s*(?:/\s*100)?").expect("valid labelled score regex"),
        Regex::new(r"(?i)(\d+)\s*/\s*100").expect("valid bare score regex"),
    ]
});

static REASONING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\*\*Reasoning:\*\*\s*(.+?)(?:\n\s*\*\*|\z)").expect("valid reasoning regex")
});

/// Builds an evaluation from free text. Never fails.
pub fn parse_evaluation_fallback(raw: &str) -> CandidateEvaluation {
    let reasoning = REASONING_PATTERN
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|r| !r.is_empty())
        .unwrap_or(raw);

    CandidateEvaluation {
        score: extract_score(raw).unwrap_or(DEFAULT_SCORE),
        reasoning: truncate_chars(reasoning, MAX_REASONING_CHARS),
        strengths: vec![],
        gaps: vec![],
        decision: "unknown".to_string(),
    }
}

/// First matching score pattern, clamped to 1..=100.
fn extract_score(raw: &str) -> Option<u8> {
    SCORE_PATTERNS.iter().find_map(|pattern| {
        let digits = pattern.captures(raw)?.get(1)?.as_str();
        // Digit strings too long for u64 are still "more than 100".
        let value = digits.parse::<u64>().unwrap_or(u64::MAX);
        Some(value.clamp(1, 100) as u8)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bold_score_above_range_clamps_to_100() {
        assert_eq!(parse_evaluation_fallback("**Score: 140/100**").score, 100);
    }

    #[test]
    fn test_no_score_pattern_defaults_to_50() {
        let evaluation = parse_evaluation_fallback("The candidate seems fine overall.");
        assert_eq!(evaluation.score, 50);
        assert_eq!(evaluation.reasoning, "The candidate seems fine overall.");
        assert_eq!(evaluation.decision, "unknown");
        assert!(evaluation.strengths.is_empty());
        assert!(evaluation.gaps.is_empty());
    }

    #[test]
    fn test_labelled_score_is_case_insensitive() {
        assert_eq!(parse_evaluation_fallback("final SCORE: 85").score, 85);
        assert_eq!(parse_evaluation_fallback("score:77 / 100").score, 77);
    }

    #[test]
    fn test_zero_clamps_to_1() {
        assert_eq!(parse_evaluation_fallback("Score: 0/100").score, 1);
    }

    #[test]
    fn test_bold_pattern_wins_over_earlier_bare_fraction() {
        let raw = "Closed 10/100 tickets.\n**Score: 64/100**";
        assert_eq!(parse_evaluation_fallback(raw).score, 64);
    }

    #[test]
    fn test_bare_fraction_misfires_on_unrelated_numbers() {
        // Pinned: with no labelled score, any "N/100" is taken as the score.
        let raw = "Resolved 10/100 incidents last quarter.";
        assert_eq!(parse_evaluation_fallback(raw).score, 10);
    }

    #[test]
    fn test_labelled_pattern_misfires_on_other_scores() {
        // Pinned: "Score:" anywhere is trusted, even a credit score.
        let raw = "Credit Score: 720 is irrelevant here.";
        assert_eq!(parse_evaluation_fallback(raw).score, 100);
    }

    #[test]
    fn test_huge_number_clamps_to_100() {
        assert_eq!(
            parse_evaluation_fallback("Score: 99999999999999999999999").score,
            100
        );
    }

    #[test]
    fn test_reasoning_stops_at_next_bold_marker() {
        let raw = "**Score: 80/100**\n**Reasoning:** Strong Rust.\nShipped services.\n**Strengths:** async";
        assert_eq!(
            parse_evaluation_fallback(raw).reasoning,
            "Strong Rust.\nShipped services."
        );
    }

    #[test]
    fn test_reasoning_runs_to_end_of_text() {
        let raw = "**Score: 55/100**\n**Reasoning:**   Limited backend exposure.  ";
        assert_eq!(
            parse_evaluation_fallback(raw).reasoning,
            "Limited backend exposure."
        );
    }

    #[test]
    fn test_reasoning_without_marker_is_truncated_raw_text() {
        let raw = "x".repeat(2500);
        let evaluation = parse_evaluation_fallback(&raw);
        assert_eq!(evaluation.reasoning.chars().count(), 2000);
        assert_eq!(evaluation.score, 50);
    }
}
