// Prompt constants for CV field extraction.

/// System prompt for structured CV extraction. Enforces JSON-only output.
pub const CV_EXTRACTION_SYSTEM: &str =
    "You are an expert at extracting structured information from resumes and CVs. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Use an empty string for missing text fields and an empty array when nothing is found.";

/// CV extraction prompt template. Replace `{cv_text}` before sending.
pub const CV_EXTRACTION_PROMPT_TEMPLATE: &str = r#"Extract the candidate's details from the CV text below.

Return a JSON object with this EXACT schema (no extra fields):
{
  "personal_info": {
    "name": "Ada Lovelace",
    "email": "ada@example.com",
    "phone": "",
    "location": "",
    "linkedin": "",
    "portfolio": ""
  },
  "experience": [
    {"title": "Senior Engineer", "company": "Analytical Engines Ltd", "duration": "2019-2024", "description": ""}
  ],
  "education": [
    {"degree": "BSc Mathematics", "institution": "University of London", "year": "2015"}
  ],
  "skills": {
    "technical_skills": ["Python", "SQL"],
    "soft_skills": ["Mentoring"],
    "tools": ["Docker"]
  }
}

List experience entries most recent first.

CV TEXT:
{cv_text}"#;
