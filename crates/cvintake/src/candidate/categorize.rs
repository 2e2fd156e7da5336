//! Best-effort skill categorization.
//!
//! A fixed keyword heuristic, not authoritative classification: the first
//! matching set in precedence order wins, and anything unmatched is filed
//! as a soft skill.

/// Category tag stored on the shared skill catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillCategory {
    Certification,
    Language,
    Framework,
    Tool,
    Technical,
    SoftSkill,
}

impl SkillCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Certification => "CERTIFICATION",
            Self::Language => "LANGUAGE",
            Self::Framework => "FRAMEWORK",
            Self::Tool => "TOOL",
            Self::Technical => "TECHNICAL",
            Self::SoftSkill => "SOFT_SKILL",
        }
    }
}

const CERTIFICATION_TERMS: &[&str] = &["certified", "certification", "pmp", "scrum", "agile"];
const LANGUAGE_TERMS: &[&str] = &["english", "spanish", "french", "mandarin", "hindi"];
const FRAMEWORK_TERMS: &[&str] = &[
    "react", "angular", "vue", "express", "django", "spring", "laravel",
];
const TOOL_TERMS: &[&str] = &["git", "docker", "jira", "slack", "figma", "photoshop"];
const TECHNICAL_TERMS: &[&str] = &[
    "javascript",
    "python",
    "java",
    "react",
    "node",
    "sql",
    "html",
    "css",
    "api",
    "git",
    "docker",
    "kubernetes",
    "aws",
    "azure",
    "mongodb",
    "postgresql",
];

/// Tags a skill name by substring match against fixed keyword sets, in
/// precedence order. First match wins.
pub fn categorize_skill(name: &str) -> SkillCategory {
    let lowered = name.to_lowercase();
    let matches = |terms: &[&str]| terms.iter().any(|term| lowered.contains(term));

    if matches(CERTIFICATION_TERMS) {
        SkillCategory::Certification
    } else if matches(LANGUAGE_TERMS) {
        SkillCategory::Language
    } else if matches(FRAMEWORK_TERMS) {
        SkillCategory::Framework
    } else if matches(TOOL_TERMS) {
        SkillCategory::Tool
    } else if matches(TECHNICAL_TERMS) {
        SkillCategory::Technical
    } else {
        SkillCategory::SoftSkill
    }
}
