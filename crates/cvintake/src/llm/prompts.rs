//! Prompt templates for the completion service.
//!
//! The extraction prompt pins the exact JSON shape the parser expects; any
//! change here is a change to the `ResumeData` wire contract.

/// Cheap round-trip used by health checks.
pub const CONNECTION_TEST_PROMPT: &str = "Hello, please respond with 'Connection successful'";

pub fn extraction_prompt(resume_text: &str) -> String {
    format!(
        r#"Extract candidate information from this resume and return ONLY valid JSON. No additional text or explanations.

RESUME TEXT:
{resume_text}

Return JSON in exactly this format (use null for missing data, empty arrays for no items):

{{
  "personal_info": {{
    "name": "Full Name",
    "email": "email@domain.com",
    "phone": "+1-xxx-xxx-xxxx",
    "address": "City, State/Country",
    "linkedin": "linkedin.com/in/username",
    "github": "github.com/username"
  }},
  "summary": "Professional summary or objective",
  "experience": [
    {{
      "company": "Company Name",
      "position": "Job Title",
      "start_date": "2020-01-01",
      "end_date": "2023-12-31",
      "is_current": false,
      "description": "Key responsibilities"
    }}
  ],
  "education": [
    {{
      "institution": "University Name",
      "degree": "Bachelor of Science",
      "field": "Computer Science",
      "start_year": 2016,
      "end_year": 2020,
      "gpa": 3.8
    }}
  ],
  "skills": ["JavaScript", "Python", "React"],
  "certifications": [
    {{
      "name": "AWS Certified Developer",
      "issuer": "Amazon Web Services",
      "issue_date": "2023-06-15",
      "expiry_date": "2026-06-15",
      "credential_id": "ABC123"
    }}
  ]
}}

JSON:"#
    )
}

pub fn summary_prompt(structured_data_json: &str) -> String {
    format!(
        "Based on the following structured resume data, generate a concise 2-3 sentence \
         professional summary highlighting the candidate's key strengths, experience level, \
         and main technical skills.\n\nResume Data:\n{structured_data_json}\n\nProfessional Summary:"
    )
}
