//! Structured field extraction from CV text, with a deterministic fallback
//! for when the model is unavailable or answers with garbage.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::extraction::prompts::{CV_EXTRACTION_PROMPT_TEMPLATE, CV_EXTRACTION_SYSTEM};
use crate::llm_client::prompts::fill_template;
use crate::llm_client::{LlmClient, LlmError};
use crate::models::candidate::{ExtractedCv, PersonalInfo};
use crate::models::evaluation::truncate_chars;

/// CV text beyond this many characters is not sent to the model.
pub const MAX_CV_TEXT_CHARS: usize = 12_000;

pub const UNKNOWN_NAME: &str = "Unknown Candidate";
pub const UNKNOWN_EMAIL: &str = "unknown@example.com";

const MAX_NAME_CHARS: usize = 200;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+").expect("valid email regex")
});

/// Turns CV text into structured fields.
#[async_trait]
pub trait StructuredFieldExtractor: Send + Sync {
    async fn extract_fields(&self, text: &str) -> Result<ExtractedCv, LlmError>;
}

/// Model-backed extractor.
pub struct LlmCvExtractor {
    llm: LlmClient,
}

impl LlmCvExtractor {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl StructuredFieldExtractor for LlmCvExtractor {
    async fn extract_fields(&self, text: &str) -> Result<ExtractedCv, LlmError> {
        let cv_text = truncate_chars(text, MAX_CV_TEXT_CHARS);
        let prompt = fill_template(CV_EXTRACTION_PROMPT_TEMPLATE, &[("cv_text", &cv_text)]);
        self.llm
            .call_json::<ExtractedCv>(&prompt, CV_EXTRACTION_SYSTEM)
            .await
    }
}

/// Minimal extraction from raw text: the first non-empty line as the name and the
/// first email-looking token. Placeholders fill whatever is not found.
pub fn fallback_extraction(text: &str) -> ExtractedCv {
    let name = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| truncate_chars(line, MAX_NAME_CHARS).trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN_NAME.to_string());

    let email = EMAIL_PATTERN
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| UNKNOWN_EMAIL.to_string());

    ExtractedCv {
        personal_info: PersonalInfo {
            name,
            email,
            ..Default::default()
        },
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_takes_first_line_and_first_email() {
        let text = "\n\n  Grace Hopper  \nRear Admiral\ncontact: grace.hopper@navy.mil or g@h.io\n";
        let cv = fallback_extraction(text);
        assert_eq!(cv.personal_info.name, "Grace Hopper");
        assert_eq!(cv.personal_info.email, "grace.hopper@navy.mil");
        assert!(cv.experience.is_empty());
        assert!(cv.skills.technical_skills.is_empty());
    }

    #[test]
    fn test_fallback_on_empty_text_uses_placeholders() {
        let cv = fallback_extraction("   \n  ");
        assert_eq!(cv.personal_info.name, UNKNOWN_NAME);
        assert_eq!(cv.personal_info.email, UNKNOWN_EMAIL);
    }

    #[test]
    fn test_fallback_without_email_keeps_name() {
        let cv = fallback_extraction("Linus Torvalds\nKernel hacker");
        assert_eq!(cv.personal_info.name, "Linus Torvalds");
        assert_eq!(cv.personal_info.email, UNKNOWN_EMAIL);
    }

    #[test]
    fn test_fallback_caps_long_first_line() {
        let cv = fallback_extraction(&"n".repeat(500));
        assert_eq!(cv.personal_info.name.chars().count(), 200);
    }
}
