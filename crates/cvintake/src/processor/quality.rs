//! Heuristic quality scoring for extracted text.
//!
//! The score gates nothing — it is metadata that lets consumers decide how
//! much to trust a degraded extraction. Weights and the keyword vocabulary
//! are tuned constants; changing them changes reported quality for every
//! historical upload, so they stay as-is.

use serde::Serialize;

/// Resume vocabulary checked case-insensitively. Two or more hits are
/// expected for any real resume.
const RESUME_KEYWORDS: [&str; 14] = [
    "experience",
    "education",
    "skills",
    "work",
    "employment",
    "university",
    "college",
    "degree",
    "bachelor",
    "master",
    "phone",
    "email",
    "address",
    "linkedin",
];

const MIN_TEXT_LENGTH: usize = 50;
const MAX_SPECIAL_CHAR_RATIO: f64 = 0.3;
const MIN_KEYWORDS: usize = 2;

const SHORT_TEXT_PENALTY: i32 = 30;
const SPECIAL_CHARS_PENALTY: i32 = 20;
const FEW_KEYWORDS_PENALTY: i32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextQuality {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl TextQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        }
    }

    fn from_confidence(confidence: u32) -> Self {
        match confidence {
            90.. => Self::Excellent,
            70..=89 => Self::Good,
            50..=69 => Self::Fair,
            _ => Self::Poor,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QualityAssessment {
    pub quality: TextQuality,
    pub confidence: u32,
    pub issues: Vec<String>,
    pub word_count: usize,
    pub character_count: usize,
    pub keywords_found: usize,
}

/// Scores extracted text. Pure — no side effects, deterministic.
///
/// Starts at 100 and deducts for short text, a high special-character ratio
/// (a common OCR artifact), and a keyword-poor body. Empty input
/// short-circuits to a zero-confidence poor result.
pub fn assess_text_quality(text: &str) -> QualityAssessment {
    if text.is_empty() {
        return QualityAssessment {
            quality: TextQuality::Poor,
            confidence: 0,
            issues: vec!["No text extracted".to_string()],
            word_count: 0,
            character_count: 0,
            keywords_found: 0,
        };
    }

    let mut issues = Vec::new();
    let mut confidence: i32 = 100;

    let character_count = text.chars().count();
    if character_count < MIN_TEXT_LENGTH {
        issues.push("Very short text extracted".to_string());
        confidence -= SHORT_TEXT_PENALTY;
    }

    let special_chars = text
        .chars()
        .filter(|c| !is_word_char(*c) && !c.is_whitespace())
        .count();
    if special_chars as f64 / character_count as f64 > MAX_SPECIAL_CHAR_RATIO {
        issues.push("High ratio of special characters".to_string());
        confidence -= SPECIAL_CHARS_PENALTY;
    }

    let lowered = text.to_lowercase();
    let keywords_found = RESUME_KEYWORDS
        .iter()
        .filter(|keyword| lowered.contains(**keyword))
        .count();
    if keywords_found < MIN_KEYWORDS {
        issues.push("Few resume-related keywords found".to_string());
        confidence -= FEW_KEYWORDS_PENALTY;
    }

    let confidence = confidence.max(0) as u32;

    QualityAssessment {
        quality: TextQuality::from_confidence(confidence),
        confidence,
        issues,
        word_count: text.split_whitespace().count(),
        character_count,
        keywords_found,
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
