//! Orchestrates structured extraction against the completion service.
//!
//! The analyzer never propagates a service failure to its caller: a dead or
//! misbehaving endpoint degrades to the regex/keyword fallback extractor.
//! Partial structured data beats no data.

use std::sync::Arc;
use std::sync::LazyLock;

use regex::Regex;

use tracing::Instrument;

use super::client::{CompletionOptions, CompletionService, LlmError};
use super::parser::parse_extraction_response;
use super::prompts;
use super::schema::{PersonalInfo, ResumeData};
use crate::config::LlmConfig;

/// Skills scanned for (case-insensitively) when the completion service is
/// unavailable. Matches are reported verbatim from this list.
const FALLBACK_SKILL_KEYWORDS: [&str; 22] = [
    "JavaScript",
    "Python",
    "Java",
    "React",
    "Node.js",
    "SQL",
    "HTML",
    "CSS",
    "Git",
    "Docker",
    "AWS",
    "MongoDB",
    "PostgreSQL",
    "TypeScript",
    "Vue.js",
    "Angular",
    "Express",
    "Django",
    "Flask",
    "Spring",
    "Laravel",
    "PHP",
];

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap()
});
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\+?1[-.\s]?)?\(?[0-9]{3}\)?[-.\s]?[0-9]{3}[-.\s]?[0-9]{4}").unwrap()
});

const SUMMARY_TEMPERATURE: f32 = 0.3;
const SUMMARY_MAX_TOKENS: u32 = 200;
const PROBE_MAX_TOKENS: u32 = 10;

/// Result of one structured-extraction attempt.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub data: ResumeData,
    /// True when the completion service failed and the heuristic extractor
    /// produced the data instead.
    pub used_fallback: bool,
    pub model: Option<String>,
}

/// Outcome of the connectivity probe. Failures are reported, never thrown.
#[derive(Debug, Clone)]
pub struct ConnectionStatus {
    pub success: bool,
    pub model: String,
    pub message: String,
}

pub struct ResumeAnalyzer {
    service: Arc<dyn CompletionService>,
    options: CompletionOptions,
}

impl ResumeAnalyzer {
    pub fn new(service: Arc<dyn CompletionService>, config: &LlmConfig) -> Self {
        Self {
            service,
            options: CompletionOptions {
                temperature: config.temperature,
                max_tokens: config.max_tokens,
            },
        }
    }

    /// Extracts structured fields from cleaned resume text. Always returns a
    /// usable structure; `used_fallback` records whether the service call
    /// failed.
    pub async fn extract(&self, resume_text: &str) -> Extraction {
        let prompt = prompts::extraction_prompt(resume_text);

        let result = self
            .service
            .complete(&prompt, &self.options)
            .instrument(tracing::info_span!("llm.extract"))
            .await;

        match result {
            Ok(completion) => Extraction {
                data: parse_extraction_response(&completion.text),
                used_fallback: false,
                model: completion.model,
            },
            Err(e) => {
                tracing::warn!("structured extraction fell back to heuristics: {}", e);
                Extraction {
                    data: fallback_extraction(resume_text),
                    used_fallback: true,
                    model: None,
                }
            }
        }
    }

    /// Produces a 2-3 sentence candidate summary from structured data,
    /// falling back to a templated sentence when the service is down.
    pub async fn summarize(&self, data: &ResumeData) -> String {
        let data_json =
            serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string());
        let prompt = prompts::summary_prompt(&data_json);

        let options = CompletionOptions {
            temperature: SUMMARY_TEMPERATURE,
            max_tokens: SUMMARY_MAX_TOKENS,
        };

        match self.service.complete(&prompt, &options).await {
            Ok(completion) => completion.text.trim().to_string(),
            Err(e) => {
                tracing::warn!("summary generation fell back to template: {}", e);
                fallback_summary(data)
            }
        }
    }

    /// Cheap round-trip for health checks.
    pub async fn test_connection(&self) -> ConnectionStatus {
        let options = CompletionOptions {
            temperature: 0.0,
            max_tokens: PROBE_MAX_TOKENS,
        };

        match self
            .service
            .complete(prompts::CONNECTION_TEST_PROMPT, &options)
            .await
        {
            Ok(_) => ConnectionStatus {
                success: true,
                model: self.service.model_name().to_string(),
                message: "Connected to completion service".to_string(),
            },
            Err(e) => ConnectionStatus {
                success: false,
                model: self.service.model_name().to_string(),
                message: format!("Failed to connect to completion service: {}", e),
            },
        }
    }
}

/// Heuristic extractor used when the completion service is unreachable:
/// email/phone patterns plus a fixed keyword scan over the raw text.
fn fallback_extraction(resume_text: &str) -> ResumeData {
    let email = EMAIL_RE
        .find(resume_text)
        .map(|m| m.as_str().to_string());
    let phone = PHONE_RE
        .find(resume_text)
        .map(|m| m.as_str().to_string());

    let lowered = resume_text.to_lowercase();
    let skills = FALLBACK_SKILL_KEYWORDS
        .iter()
        .filter(|skill| lowered.contains(&skill.to_lowercase()))
        .map(|skill| skill.to_string())
        .collect();

    ResumeData {
        personal_info: PersonalInfo {
            email,
            phone,
            ..PersonalInfo::default()
        },
        skills,
        ..ResumeData::default()
    }
}

/// Templated summary from name, experience count, and leading skills.
fn fallback_summary(data: &ResumeData) -> String {
    let name = data
        .personal_info
        .name
        .as_deref()
        .unwrap_or("Candidate");
    let entries = data.experience.len();
    let skills = if data.skills.is_empty() {
        "various technologies".to_string()
    } else {
        data.skills
            .iter()
            .take(5)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "{} is a professional with {} work experience entr{} and expertise in {}.",
        name,
        entries,
        if entries == 1 { "y" } else { "ies" },
        skills
    )
}
