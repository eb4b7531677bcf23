use crate::models::candidate::ExtractedCv;

const SUMMARY_SKILL_COUNT: usize = 5;

/// Deterministic one-paragraph summary of extracted CV data.
///
/// `fallback_name` is used when the extraction carries no name. Empty extraction
/// data yields a one-line summary naming the candidate.
pub fn compose_summary(fallback_name: &str, cv: &ExtractedCv) -> String {
    let name = [cv.personal_info.name.trim(), fallback_name.trim()]
        .into_iter()
        .find(|n| !n.is_empty())
        .unwrap_or("Unknown");

    if cv.is_empty() {
        return format!("Summary for {name}: no CV data available.");
    }

    let mut parts = vec![format!(
        "{name} is a candidate with {} roles of work experience.",
        cv.experience.len()
    )];

    if let Some(latest) = cv.experience.first() {
        parts.push(format!(
            "Most recently worked as {} at {}.",
            or_unknown(&latest.title),
            or_unknown(&latest.company)
        ));
    }

    let skills: Vec<&str> = cv
        .skills
        .technical_skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .take(SUMMARY_SKILL_COUNT)
        .collect();
    if !skills.is_empty() {
        parts.push(format!(
            "Key technical skills include: {}.",
            skills.join(", ")
        ));
    }

    parts.join(" ")
}

fn or_unknown(value: &str) -> &str {
    if value.trim().is_empty() {
        "Unknown"
    } else {
        value.trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::candidate::{Skills, WorkExperience};

    #[test]
    fn test_summary_mentions_latest_role_and_first_five_skills() {
        let mut cv = ExtractedCv {
            experience: vec![
                WorkExperience {
                    title: "Staff Engineer".to_string(),
                    company: "Initech".to_string(),
                    ..Default::default()
                },
                WorkExperience::default(),
            ],
            skills: Skills {
                technical_skills: ["Rust", "Go", "SQL", "Kafka", "Redis", "Terraform"]
                    .map(String::from)
                    .to_vec(),
                ..Default::default()
            },
            ..Default::default()
        };
        cv.personal_info.name = "Ada Lovelace".to_string();

        let summary = compose_summary("ignored", &cv);
        assert_eq!(
            summary,
            "Ada Lovelace is a candidate with 2 roles of work experience. \
             Most recently worked as Staff Engineer at Initech. \
             Key technical skills include: Rust, Go, SQL, Kafka, Redis."
        );
    }

    #[test]
    fn test_summary_for_empty_data_names_candidate() {
        let summary = compose_summary("Grace", &ExtractedCv::default());
        assert_eq!(summary, "Summary for Grace: no CV data available.");
    }

    #[test]
    fn test_summary_uses_fallback_name_when_extraction_has_none() {
        let cv = ExtractedCv {
            skills: Skills {
                tools: vec!["Git".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        let summary = compose_summary("Grace", &cv);
        assert_eq!(summary, "Grace is a candidate with 0 roles of work experience.");
    }
}
