use async_trait::async_trait;

use crate::evaluation::prompts::{JOB_SKILLS_PROMPT_TEMPLATE, JOB_SKILLS_SYSTEM};
use crate::llm_client::prompts::fill_template;
use crate::llm_client::{LlmClient, LlmError};
use crate::models::evaluation::JobSkills;

/// Pulls the required skills out of a job description.
#[async_trait]
pub trait JobSkillExtractor: Send + Sync {
    async fn extract_skills(&self, job_description: &str) -> Result<JobSkills, LlmError>;
}

pub struct LlmJobSkillExtractor {
    llm: LlmClient,
}

impl LlmJobSkillExtractor {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl JobSkillExtractor for LlmJobSkillExtractor {
    async fn extract_skills(&self, job_description: &str) -> Result<JobSkills, LlmError> {
        let prompt = fill_template(
            JOB_SKILLS_PROMPT_TEMPLATE,
            &[("job_description", job_description)],
        );
        self.llm.call_json::<JobSkills>(&prompt, JOB_SKILLS_SYSTEM).await
    }
}
