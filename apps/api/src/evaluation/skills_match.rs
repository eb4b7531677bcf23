use std::collections::HashSet;

use crate::models::evaluation::SkillsMatch;

/// Lowercased, whitespace-collapsed skill name without trailing version tokens,
/// so `"Python 3"` and `"python"` compare equal.
pub fn canonical_skill(skill: &str) -> String {
    let lowered = skill.to_lowercase();
    let mut tokens: Vec<&str> = lowered.split_whitespace().collect();
    while tokens.len() > 1 && tokens.last().is_some_and(|t| is_version_token(t)) {
        tokens.pop();
    }
    tokens.join(" ")
}

fn is_version_token(token: &str) -> bool {
    let token = token.strip_prefix('v').unwrap_or(token);
    token.chars().any(|c| c.is_ascii_digit())
        && token.chars().all(|c| c.is_ascii_digit() || c == '.')
}

/// Splits the required skills into those the candidate lists and those it does not.
///
/// Required skills keep their original spelling and first-appearance order;
/// duplicates (after canonicalisation) and blanks are dropped.
pub fn match_skills(required: &[String], candidate: &[String]) -> SkillsMatch {
    let have: HashSet<String> = candidate.iter().map(|s| canonical_skill(s)).collect();
    let mut seen = HashSet::new();
    let mut result = SkillsMatch::default();

    for skill in required {
        let canonical = canonical_skill(skill);
        if canonical.is_empty() || !seen.insert(canonical.clone()) {
            continue;
        }
        if have.contains(&canonical) {
            result.strong.push(skill.trim().to_string());
        } else {
            result.missing.push(skill.trim().to_string());
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_versioned_candidate_skill_matches_required() {
        let result = match_skills(&strings(&["Python", "SQL"]), &strings(&["python 3", "java"]));
        assert_eq!(result.strong, vec!["Python"]);
        assert_eq!(result.missing, vec!["SQL"]);
        assert!(result.partial.is_empty());
    }

    #[test]
    fn test_canonical_skill_forms() {
        assert_eq!(canonical_skill("  Node.js   v18 "), "node.js");
        assert_eq!(canonical_skill("C++ 17"), "c++");
        assert_eq!(canonical_skill("Spring  Boot"), "spring boot");
        assert_eq!(canonical_skill("3"), "3");
        assert_eq!(canonical_skill("Python 3.11"), "python");
    }

    #[test]
    fn test_duplicate_and_blank_requirements_are_dropped() {
        let result = match_skills(&strings(&["Rust", "rust", " ", "Go"]), &strings(&["RUST"]));
        assert_eq!(result.strong, vec!["Rust"]);
        assert_eq!(result.missing, vec!["Go"]);
    }

    #[test]
    fn test_no_candidate_skills_means_all_missing() {
        let result = match_skills(&strings(&["Kafka"]), &[]);
        assert!(result.strong.is_empty());
        assert_eq!(result.missing, vec!["Kafka"]);
    }
}
