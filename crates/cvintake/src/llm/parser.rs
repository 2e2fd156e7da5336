//! Recovery parser for completion-service extraction responses.
//!
//! Model output is treated as hostile: wrapped in prose or code fences,
//! littered with trailing commas, or cut off mid-array when the token limit
//! hits. Recovery is an ordered chain of strategies, each a pure
//! `&str -> Option<Value>`, tried until one yields JSON. Whatever survives
//! is pushed through the schema normalizer, so this function is total — it
//! never fails and always returns a fully-defaulted structure.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::schema::{normalize, ResumeData};

type Strategy = fn(&str) -> Option<Value>;

/// Tried in order; the first strategy producing JSON wins.
const STRATEGIES: &[(&str, Strategy)] = &[
    ("repaired_parse", parse_repaired),
    ("truncation_recovery", parse_truncated),
    ("field_regex", extract_fields_manually),
];

/// Parses a raw model response into the canonical schema. Never fails.
pub fn parse_extraction_response(response: &str) -> ResumeData {
    for (name, strategy) in STRATEGIES {
        if let Some(value) = strategy(response) {
            tracing::debug!(strategy = name, "extraction response recovered");
            return normalize(&value);
        }
    }

    // The regex strategy always produces a value; this is unreachable in
    // practice but keeps the contract explicit.
    ResumeData::default()
}

static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)```(?:json)?\s*").unwrap());
static TRAILING_COMMA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").unwrap());
static TRAILING_COMMA_EOF_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s*$").unwrap());
static DANGLING_PROPERTY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#",\s*"[^"]*$"#).unwrap());
static UNTERMINATED_STRING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#":\s*"[^"]*$"#).unwrap());
static UNTERMINATED_ARRAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(:\s*\[[^\]]*)$").unwrap());

/// Shared preamble for the JSON strategies: strip code fences, slice to the
/// JSON-looking region, apply lexical repairs for the common model
/// mistakes.
///
/// The slice normally runs from the first `{` to the last `}` (models wrap
/// JSON in prose despite instructions). When the text *after* the last `}`
/// still contains JSON punctuation, the document was interrupted rather
/// than wrapped — slicing to that `}` would throw away every field after
/// the last complete object, so the tail is kept for the truncation
/// strategy to repair.
fn prepare_json(response: &str) -> String {
    let stripped = FENCE_RE.replace_all(response.trim(), "").into_owned();

    let Some(start) = stripped.find('{') else {
        return stripped.trim().to_string();
    };

    let sliced = match stripped.rfind('}') {
        Some(end) if end > start && !looks_interrupted(&stripped[end + 1..]) => {
            &stripped[start..=end]
        }
        _ => &stripped[start..],
    };

    let cleaned = TRAILING_COMMA_RE.replace_all(sliced, "$1");
    let cleaned = TRAILING_COMMA_EOF_RE.replace(&cleaned, "");
    let cleaned = DANGLING_PROPERTY_RE.replace(&cleaned, "");
    let cleaned = UNTERMINATED_STRING_RE.replace(&cleaned, ": null");
    let cleaned = UNTERMINATED_ARRAY_RE.replace(&cleaned, "$1]");
    cleaned.trim().to_string()
}

fn looks_interrupted(tail: &str) -> bool {
    tail.chars()
        .any(|c| matches!(c, '{' | '[' | ']' | ':' | ',' | '"'))
}

fn parse_repaired(response: &str) -> Option<Value> {
    serde_json::from_str(&prepare_json(response)).ok()
}

/// Recovers from a response truncated mid-generation — the dominant failure
/// mode when the model runs out of tokens mid-array.
///
/// First tries the largest prefix that returns to nesting depth 0 (handles
/// trailing junk after a complete document). Failing that, cuts back to the
/// last complete value and closes every still-open brace/bracket; fields
/// completed before the cut survive, the interrupted tail is lost.
fn parse_truncated(response: &str) -> Option<Value> {
    let cleaned = prepare_json(response);

    if let Some(value) = parse_depth_zero_prefix(&cleaned) {
        return Some(value);
    }

    balance_and_parse(&cleaned)
}

/// Walks the text tracking `{`/`[` depth while respecting string boundaries
/// and escapes; parses the substring up to the last index where depth
/// returned to 0.
fn parse_depth_zero_prefix(cleaned: &str) -> Option<Value> {
    let mut depth: i64 = 0;
    let mut last_valid: usize = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, c) in cleaned.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match c {
            '\\' => escape_next = true,
            '"' => in_string = !in_string,
            '{' | '[' if !in_string => depth += 1,
            '}' | ']' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    last_valid = i + c.len_utf8();
                }
            }
            _ => {}
        }
    }

    if last_valid > 0 {
        serde_json::from_str(&cleaned[..last_valid]).ok()
    } else {
        None
    }
}

/// Cuts the text back to the end of the last complete string or container,
/// drops a dangling key, comma, or just-opened container, then appends the
/// closers for every delimiter still open at that point.
fn balance_and_parse(cleaned: &str) -> Option<Value> {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escape_next = false;
    // Byte index just past the last complete value, with the open-delimiter
    // stack as of that point.
    let mut last_safe: Option<(usize, Vec<char>)> = None;

    for (i, c) in cleaned.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        if in_string {
            match c {
                '\\' => escape_next = true,
                '"' => {
                    in_string = false;
                    last_safe = Some((i + 1, stack.clone()));
                }
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.last() == Some(&c) {
                    stack.pop();
                    last_safe = Some((i + c.len_utf8(), stack.clone()));
                } else {
                    // Mismatched closer: structural damage starts here.
                    break;
                }
            }
            _ => {}
        }
    }

    let (cut, mut open) = last_safe?;
    let mut candidate = cleaned[..cut].to_string();

    // A string followed by ':' in the dropped tail was a key, not a value —
    // remove it along with whatever introduced it.
    if cleaned[cut..].trim_start().starts_with(':') && candidate.ends_with('"') {
        if let Some(key_start) = candidate[..candidate.len() - 1].rfind('"') {
            candidate.truncate(key_start);
        }
    }

    loop {
        let trimmed_len = candidate.trim_end().len();
        candidate.truncate(trimmed_len);

        if candidate.ends_with(',') {
            candidate.pop();
        } else if candidate.ends_with('{') || candidate.ends_with('[') {
            // A container that never received content.
            candidate.pop();
            open.pop();
        } else {
            break;
        }
    }

    if candidate.is_empty() {
        return None;
    }

    for closer in open.iter().rev() {
        candidate.push(*closer);
    }

    serde_json::from_str(&candidate).ok()
}

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| field_regex("name"));
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| field_regex("email"));
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| field_regex("phone"));
static ADDRESS_RE: LazyLock<Regex> = LazyLock::new(|| field_regex("address"));
static LINKEDIN_RE: LazyLock<Regex> = LazyLock::new(|| field_regex("linkedin"));
static SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| field_regex("summary"));
static SKILLS_ARRAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)"skills"\s*:\s*\[(.*?)\]"#).unwrap());
static QUOTED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""([^"]+)""#).unwrap());

fn field_regex(field: &str) -> Regex {
    Regex::new(&format!(r#""{}"\s*:\s*"([^"]+)""#, field)).unwrap()
}

/// Last resort: pull individual fields out of the wreckage. Only ever
/// recovers a subset — it exists so a catastrophically malformed response
/// still yields some contact data rather than nothing.
fn extract_fields_manually(response: &str) -> Option<Value> {
    let mut personal = serde_json::Map::new();
    for (key, re) in [
        ("name", &*NAME_RE),
        ("email", &*EMAIL_RE),
        ("phone", &*PHONE_RE),
        ("address", &*ADDRESS_RE),
        ("linkedin", &*LINKEDIN_RE),
    ] {
        if let Some(captures) = re.captures(response) {
            personal.insert(key.to_string(), Value::String(captures[1].to_string()));
        }
    }

    let mut data = serde_json::Map::new();
    data.insert("personal_info".to_string(), Value::Object(personal));

    if let Some(captures) = SUMMARY_RE.captures(response) {
        data.insert(
            "summary".to_string(),
            Value::String(captures[1].to_string()),
        );
    }

    if let Some(captures) = SKILLS_ARRAY_RE.captures(response) {
        let skills: Vec<Value> = QUOTED_RE
            .captures_iter(&captures[1])
            .map(|c| Value::String(c[1].to_string()))
            .collect();
        data.insert("skills".to_string(), Value::Array(skills));
    }

    Some(Value::Object(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::schema::Certification;

    const VALID_RESPONSE: &str = r#"{
        "personal_info": {
            "name": "Jane Doe",
            "email": "jane@example.com",
            "phone": "+1-555-0100",
            "address": "Portland, OR",
            "linkedin": "linkedin.com/in/janedoe",
            "github": null
        },
        "summary": "Backend engineer with eight years of experience.",
        "skills": ["Rust", "PostgreSQL", "Docker"],
        "experience": [
            {
                "company": "Acme Corp",
                "position": "Engineer",
                "start_date": "2019-01-01",
                "end_date": "2021-01-01",
                "is_current": false,
                "description": "Built the billing system"
            }
        ],
        "education": [
            {
                "institution": "State University",
                "degree": "BSc",
                "field": "Computer Science",
                "start_year": 2012,
                "end_year": 2016,
                "gpa": 3.7
            }
        ],
        "certifications": ["AWS Certified Developer"]
    }"#;

    #[test]
    fn test_parses_clean_json() {
        let data = parse_extraction_response(VALID_RESPONSE);
        assert_eq!(data.personal_info.name.as_deref(), Some("Jane Doe"));
        assert_eq!(data.skills.len(), 3);
        assert_eq!(data.experience.len(), 1);
        assert_eq!(data.education.len(), 1);
        assert_eq!(data.certifications.len(), 1);
    }

    #[test]
    fn test_strips_code_fences() {
        let wrapped = format!("```json\n{}\n```", VALID_RESPONSE);
        let data = parse_extraction_response(&wrapped);
        assert_eq!(data.personal_info.name.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn test_slices_surrounding_prose() {
        let wrapped = format!(
            "Sure! Here is the extracted data:\n{}\nLet me know if you need anything else.",
            VALID_RESPONSE
        );
        let data = parse_extraction_response(&wrapped);
        assert_eq!(data.personal_info.email.as_deref(), Some("jane@example.com"));
    }

    #[test]
    fn test_repairs_trailing_commas() {
        let response = r#"{"personal_info": {"name": "Jo",}, "skills": ["Rust",],}"#;
        let data = parse_extraction_response(response);
        assert_eq!(data.personal_info.name.as_deref(), Some("Jo"));
        assert_eq!(data.skills, vec!["Rust"]);
    }

    #[test]
    fn test_recovers_unterminated_string_value() {
        let response = r#"{"personal_info": {"name": "Jo"}, "summary": "cut off mid sent"#;
        let data = parse_extraction_response(response);
        assert_eq!(data.personal_info.name.as_deref(), Some("Jo"));
        // The interrupted value is lost, not fabricated.
        assert!(data.summary.is_none());
    }

    #[test]
    fn test_recovers_truncation_mid_array() {
        // Cut mid-way through the skills array: every complete field before
        // the cut survives, including the complete leading skills.
        let truncated = r#"{"personal_info": {"name": "Jane Doe", "email": "jane@example.com"}, "skills": ["Rust", "SQL", "Doc"#;
        let data = parse_extraction_response(truncated);
        assert_eq!(data.personal_info.name.as_deref(), Some("Jane Doe"));
        assert_eq!(data.personal_info.email.as_deref(), Some("jane@example.com"));
        assert!(data.skills.contains(&"Rust".to_string()));
        assert!(data.skills.contains(&"SQL".to_string()));
        // The interrupted element is gone.
        assert!(!data.skills.iter().any(|s| s.starts_with("Doc")));
    }

    #[test]
    fn test_recovers_truncation_mid_object_array() {
        let truncated = r#"{"personal_info": {"name": "Jane"}, "experience": [{"company": "Acme", "position": "Engineer"}, {"company": "Burn"#;
        let data = parse_extraction_response(truncated);
        assert_eq!(data.personal_info.name.as_deref(), Some("Jane"));
        assert_eq!(data.experience.len(), 1);
        assert_eq!(data.experience[0].company.as_deref(), Some("Acme"));
    }

    #[test]
    fn test_trailing_junk_after_complete_document() {
        let response = format!("{}{}", VALID_RESPONSE, " and then the model kept talking {{");
        let data = parse_extraction_response(&response);
        assert_eq!(data.personal_info.name.as_deref(), Some("Jane Doe"));
        assert_eq!(data.skills.len(), 3);
    }

    #[test]
    fn test_regex_fallback_on_hopeless_input() {
        // Braces out of order; no JSON strategy can salvage this, but the
        // field patterns still find the contact data.
        let response = r#"}} broken "name": "Jane Doe" garbage "email": "jane@x.co" {{ "skills": ["Python", "SQL"] more"#;
        let data = parse_extraction_response(response);
        assert_eq!(data.personal_info.name.as_deref(), Some("Jane Doe"));
        assert_eq!(data.personal_info.email.as_deref(), Some("jane@x.co"));
        assert_eq!(data.skills, vec!["Python", "SQL"]);
    }

    #[test]
    fn test_empty_and_non_json_inputs_yield_defaults() {
        for input in ["", "   ", "no json here at all", "{", "]"] {
            let data = parse_extraction_response(input);
            assert!(data.personal_info.name.is_none(), "input: {:?}", input);
            assert!(data.skills.is_empty());
            assert!(data.experience.is_empty());
            assert!(data.education.is_empty());
            assert!(data.certifications.is_empty());
        }
    }

    #[test]
    fn test_never_panics_on_arbitrary_truncations() {
        // Deterministic fuzz: every byte-boundary prefix of a valid
        // response must parse into a well-formed structure.
        for end in 0..=VALID_RESPONSE.len() {
            if !VALID_RESPONSE.is_char_boundary(end) {
                continue;
            }
            let data = parse_extraction_response(&VALID_RESPONSE[..end]);
            // The structure is always fully formed; content varies with the
            // truncation point.
            let _ = (
                &data.personal_info,
                &data.summary,
                &data.skills,
                &data.experience,
                &data.education,
                &data.certifications,
            );
        }
    }

    #[test]
    fn test_truncation_preserves_complete_top_level_fields() {
        // Once the skills array has closed, any later truncation point must
        // still yield name, email, summary, and the full skills list.
        let skills_close = VALID_RESPONSE.find("\"Docker\"]").unwrap() + "\"Docker\"]".len();
        for end in [skills_close, skills_close + 11, VALID_RESPONSE.len()] {
            let end = (end..=VALID_RESPONSE.len())
                .find(|i| VALID_RESPONSE.is_char_boundary(*i))
                .unwrap();
            let data = parse_extraction_response(&VALID_RESPONSE[..end]);
            assert_eq!(
                data.personal_info.name.as_deref(),
                Some("Jane Doe"),
                "end={}",
                end
            );
            assert_eq!(
                data.personal_info.email.as_deref(),
                Some("jane@example.com"),
                "end={}",
                end
            );
            assert!(data.summary.is_some(), "end={}", end);
            assert_eq!(data.skills.len(), 3, "end={}", end);
        }
    }

    #[test]
    fn test_certification_objects_survive_parse() {
        let response = r#"{"certifications": [{"name": "CKA", "issuer": "CNCF"}, "PMP"]}"#;
        let data = parse_extraction_response(response);
        assert_eq!(data.certifications.len(), 2);
        assert!(matches!(&data.certifications[1], Certification::Name(n) if n == "PMP"));
    }
}
