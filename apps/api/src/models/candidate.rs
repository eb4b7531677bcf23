use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who a CV belongs to, as submitted by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateIdentity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// Opaque reference to the uploading user ("My Resumes" association).
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
}

/// One entry of a batch: an identity plus a CV path under the intake directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateSubmission {
    #[serde(flatten)]
    pub identity: CandidateIdentity,
    #[serde(default)]
    pub cv_file_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub linkedin: String,
    pub portfolio: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkExperience {
    pub title: String,
    pub company: String,
    pub duration: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    pub degree: String,
    pub institution: String,
    pub year: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Skills {
    pub technical_skills: Vec<String>,
    pub soft_skills: Vec<String>,
    pub tools: Vec<String>,
}

/// Structured fields pulled out of a CV. Every field defaults, so a partial
/// model response still deserializes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedCv {
    pub personal_info: PersonalInfo,
    pub experience: Vec<WorkExperience>,
    pub education: Vec<Education>,
    pub skills: Skills,
}

impl ExtractedCv {
    pub fn is_empty(&self) -> bool {
        *self == ExtractedCv::default()
    }

    /// Technical skills followed by tools, the set compared against job requirements.
    pub fn matchable_skills(&self) -> Vec<String> {
        self.skills
            .technical_skills
            .iter()
            .chain(self.skills.tools.iter())
            .cloned()
            .collect()
    }
}

/// The persisted candidate document written once by the extraction pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub user_email: Option<String>,
    pub candidate_name: String,
    pub candidate_email: String,
    pub cv_object_name: String,
    pub cv_link: String,
    pub extracted_cv_data: ExtractedCv,
    pub summary: String,
    pub batch_id: Option<Uuid>,
    pub errors: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl CandidateRecord {
    /// Candidates with neither extracted data nor a summary cannot be scored.
    pub fn is_evaluable(&self) -> bool {
        !self.extracted_cv_data.is_empty() || !self.summary.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(extracted: ExtractedCv, summary: &str) -> CandidateRecord {
        CandidateRecord {
            id: Uuid::new_v4(),
            user_id: None,
            user_email: None,
            candidate_name: "Ada".to_string(),
            candidate_email: "ada@example.com".to_string(),
            cv_object_name: String::new(),
            cv_link: String::new(),
            extracted_cv_data: extracted,
            summary: summary.to_string(),
            batch_id: None,
            errors: vec![],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_partial_model_output_deserializes_with_defaults() {
        let json = r#"{"personal_info": {"name": "Ada Lovelace"}, "skills": {"tools": ["Git"]}}"#;
        let cv: ExtractedCv = serde_json::from_str(json).unwrap();
        assert_eq!(cv.personal_info.name, "Ada Lovelace");
        assert_eq!(cv.personal_info.email, "");
        assert!(cv.experience.is_empty());
        assert_eq!(cv.skills.tools, vec!["Git".to_string()]);
    }

    #[test]
    fn test_matchable_skills_combines_technical_and_tools() {
        let cv = ExtractedCv {
            skills: Skills {
                technical_skills: vec!["Rust".to_string()],
                soft_skills: vec!["Mentoring".to_string()],
                tools: vec!["Docker".to_string()],
            },
            ..Default::default()
        };
        assert_eq!(cv.matchable_skills(), vec!["Rust", "Docker"]);
    }

    #[test]
    fn test_candidate_without_data_or_summary_is_not_evaluable() {
        assert!(!record(ExtractedCv::default(), "  ").is_evaluable());
        assert!(record(ExtractedCv::default(), "Ada is a candidate").is_evaluable());

        let mut cv = ExtractedCv::default();
        cv.personal_info.name = "Ada".to_string();
        assert!(record(cv, "").is_evaluable());
    }

    #[test]
    fn test_submission_flattens_identity() {
        let json = r#"{"name": "Ada", "email": "ada@example.com", "cv_file_path": "/tmp/ada.pdf"}"#;
        let submission: CandidateSubmission = serde_json::from_str(json).unwrap();
        assert_eq!(submission.identity.name, "Ada");
        assert_eq!(submission.cv_file_path, "/tmp/ada.pdf");
        assert!(submission.identity.user_id.is_none());
    }
}
