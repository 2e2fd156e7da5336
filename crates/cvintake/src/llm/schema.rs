//! Canonical structured-resume schema.
//!
//! This is the contract between the completion service's JSON output, the
//! recovery parser, and the candidate materializer. Every optional field
//! defaults to `None`/empty — downstream consumers branch on value nullness,
//! never on key presence. The string-or-object certification polymorphism of
//! the wire format is confined to the `Certification` union here.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub github: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub start_year: Option<i32>,
    #[serde(default)]
    pub end_year: Option<i32>,
    #[serde(default)]
    pub gpa: Option<f64>,
}

/// Certifications arrive either as bare names or as detailed objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Certification {
    Name(String),
    Detailed(CertificationDetail),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CertificationDetail {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub issue_date: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<String>,
    #[serde(default)]
    pub credential_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeData {
    #[serde(default)]
    pub personal_info: PersonalInfo,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub certifications: Vec<Certification>,
}

/// Converts a loosely-shaped JSON value into the fully-defaulted schema.
///
/// Element-wise and null-tolerant: a malformed entry (wrong type, null in a
/// string array) is dropped or defaulted rather than failing the whole
/// conversion — the parser's recovery strategies feed partially-repaired
/// values through here.
pub fn normalize(value: &Value) -> ResumeData {
    let personal = value.get("personal_info");

    ResumeData {
        personal_info: PersonalInfo {
            name: string_field(personal, "name"),
            email: string_field(personal, "email"),
            phone: string_field(personal, "phone"),
            address: string_field(personal, "address"),
            linkedin: string_field(personal, "linkedin"),
            github: string_field(personal, "github"),
        },
        summary: value.get("summary").and_then(as_clean_string),
        skills: value
            .get("skills")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default(),
        experience: array_field(value, "experience", |item| ExperienceEntry {
            company: item.get("company").and_then(as_clean_string),
            position: item.get("position").and_then(as_clean_string),
            start_date: item.get("start_date").and_then(as_clean_string),
            end_date: item.get("end_date").and_then(as_clean_string),
            is_current: item
                .get("is_current")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            description: item.get("description").and_then(as_clean_string),
        }),
        education: array_field(value, "education", |item| EducationEntry {
            institution: item.get("institution").and_then(as_clean_string),
            degree: item.get("degree").and_then(as_clean_string),
            field: item.get("field").and_then(as_clean_string),
            start_year: item.get("start_year").and_then(as_year),
            end_year: item.get("end_year").and_then(as_year),
            gpa: item.get("gpa").and_then(as_number),
        }),
        certifications: value
            .get("certifications")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(as_certification).collect())
            .unwrap_or_default(),
    }
}

fn string_field(parent: Option<&Value>, key: &str) -> Option<String> {
    parent?.get(key).and_then(as_clean_string)
}

fn as_clean_string(value: &Value) -> Option<String> {
    let s = value.as_str()?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn as_year(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().map(|v| v as i32),
        // Models sometimes quote years.
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_certification(value: &Value) -> Option<Certification> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(Certification::Name(trimmed.to_string()))
            }
        }
        Value::Object(_) => Some(Certification::Detailed(CertificationDetail {
            name: value.get("name").and_then(as_clean_string),
            issuer: value.get("issuer").and_then(as_clean_string),
            issue_date: value.get("issue_date").and_then(as_clean_string),
            expiry_date: value.get("expiry_date").and_then(as_clean_string),
            credential_id: value.get("credential_id").and_then(as_clean_string),
        })),
        _ => None,
    }
}

fn array_field<T>(value: &Value, key: &str, convert: impl Fn(&Value) -> T) -> Vec<T> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter(|item| item.is_object())
                .map(convert)
                .collect()
        })
        .unwrap_or_default()
}
