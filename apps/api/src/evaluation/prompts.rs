// Prompt constants for job-skill extraction and candidate scoring.

/// System prompt for job-skill extraction. Enforces JSON-only output.
pub const JOB_SKILLS_SYSTEM: &str =
    "Extract the technical and soft skills required for a job position. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Job-skill prompt template. Replace `{job_description}` before sending.
pub const JOB_SKILLS_PROMPT_TEMPLATE: &str = r#"Return a JSON object with this EXACT schema:
{
  "tech_skills": ["Python", "SQL"],
  "soft_skills": ["Communication"]
}

Use short canonical skill names without version numbers.

Job Description:
{job_description}"#;

/// System prompt for candidate scoring.
pub const EVALUATION_SYSTEM: &str =
    "You are an expert HR evaluator. Evaluate the candidate based on their summary \
    and the job requirements. You MUST respond with ONLY a single valid JSON object, \
    no markdown, no extra text.";

/// Scoring prompt template. Replace `{summary}` and `{job_description}`.
pub const EVALUATION_PROMPT_TEMPLATE: &str = r#"Return a JSON object with this EXACT schema:
{
  "score": 72,
  "reasoning": "Why the candidate does or does not fit, in a few sentences.",
  "strengths": ["..."],
  "gaps": ["..."],
  "decision": "hire"
}

"score" is an integer from 1 to 100. "decision" is a short label such as "hire" or "not hire".

Candidate Summary:
{summary}

Job Description:
{job_description}"#;
