//! Materializes extracted resume data into the relational candidate graph.
//!
//! All writes happen inside one transaction: either the complete graph
//! (candidate, work experience, education, skills, certifications) lands or
//! none of it does. The skill catalog is shared across candidates and
//! upserted with a storage-level create-if-absent, so concurrent
//! materializations never duplicate a name.

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::candidate_repo::CandidateRow;
use crate::db::{Database, DatabaseError};
use crate::llm::schema::{Certification, ResumeData};

use super::categorize::categorize_skill;
use super::dates::{parse_flexible_date, years_of_experience};

/// Placeholder proficiency for every extracted skill. Proficiency scoring
/// from raw resume text is out of scope; consumers treat this as "present,
/// strength unknown".
const DEFAULT_PROFICIENCY: f64 = 0.8;

/// Creates the full candidate graph for one resume. Atomic: a failure in
/// any sub-step rolls the whole graph back.
pub fn materialize(
    db: &Database,
    data: &ResumeData,
    resume_id: &str,
    today: NaiveDate,
) -> Result<CandidateRow, DatabaseError> {
    let _span = tracing::info_span!("candidate.materialize", resume_id).entered();

    let candidate_id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    db.with_conn(|conn| {
        let tx = conn.unchecked_transaction()?;

        // A candidate record must always have a displayable name.
        let full_name = data
            .personal_info
            .name
            .as_deref()
            .unwrap_or("Unknown");
        let years = years_of_experience(&data.experience, today);

        tx.execute(
            "INSERT INTO candidates (id, resume_id, full_name, email, phone, location, summary,
             years_experience, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'ACTIVE', ?9, ?9)",
            params![
                candidate_id,
                resume_id,
                full_name,
                data.personal_info.email,
                data.personal_info.phone,
                data.personal_info.address,
                data.summary,
                years,
                now,
            ],
        )?;

        insert_work_experience(&tx, &candidate_id, data)?;
        insert_education(&tx, &candidate_id, data)?;
        insert_skills(&tx, &candidate_id, data, &now)?;
        insert_certifications(&tx, &candidate_id, data)?;

        tx.commit()?;

        tracing::debug!(
            candidate_id = %candidate_id,
            skills = data.skills.len(),
            experience = data.experience.len(),
            "candidate graph created"
        );

        Ok(CandidateRow {
            id: candidate_id.clone(),
            resume_id: resume_id.to_string(),
            full_name: full_name.to_string(),
            email: data.personal_info.email.clone(),
            phone: data.personal_info.phone.clone(),
            location: data.personal_info.address.clone(),
            summary: data.summary.clone(),
            years_experience: years,
            status: "ACTIVE".to_string(),
            created_at: now.clone(),
            updated_at: now.clone(),
        })
    })
}

fn insert_work_experience(
    tx: &Connection,
    candidate_id: &str,
    data: &ResumeData,
) -> Result<(), DatabaseError> {
    for entry in &data.experience {
        // Company and position render directly in UI lists; placeholders
        // beat nulls there.
        tx.execute(
            "INSERT INTO work_experience (candidate_id, company, position, start_date, end_date,
             is_current, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                candidate_id,
                entry.company.as_deref().unwrap_or("Unknown Company"),
                entry.position.as_deref().unwrap_or("Unknown Position"),
                normalized_date(entry.start_date.as_deref()),
                normalized_date(entry.end_date.as_deref()),
                entry.is_current,
                entry.description,
            ],
        )?;
    }
    Ok(())
}

fn insert_education(
    tx: &Connection,
    candidate_id: &str,
    data: &ResumeData,
) -> Result<(), DatabaseError> {
    for entry in &data.education {
        tx.execute(
            "INSERT INTO education (candidate_id, institution, degree, field, start_year,
             end_year, gpa)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                candidate_id,
                entry.institution.as_deref().unwrap_or("Unknown Institution"),
                entry.degree.as_deref().unwrap_or("Unknown Degree"),
                entry.field,
                entry.start_year,
                entry.end_year,
                entry.gpa,
            ],
        )?;
    }
    Ok(())
}

fn insert_skills(
    tx: &Connection,
    candidate_id: &str,
    data: &ResumeData,
    now: &str,
) -> Result<(), DatabaseError> {
    for raw_name in &data.skills {
        let name = raw_name.trim();
        if name.is_empty() {
            continue;
        }

        // Create-if-absent keyed by the case-insensitive unique name; the
        // first writer's casing is preserved.
        tx.execute(
            "INSERT INTO skills (name, category, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO NOTHING",
            params![name, categorize_skill(name).as_str(), now],
        )?;

        let skill_id: i64 = tx.query_row(
            "SELECT id FROM skills WHERE name = ?1",
            params![name],
            |r| r.get(0),
        )?;

        // The same skill may appear twice in one extraction; keep one join.
        tx.execute(
            "INSERT OR IGNORE INTO candidate_skills (candidate_id, skill_id, proficiency)
             VALUES (?1, ?2, ?3)",
            params![candidate_id, skill_id, DEFAULT_PROFICIENCY],
        )?;
    }
    Ok(())
}

fn insert_certifications(
    tx: &Connection,
    candidate_id: &str,
    data: &ResumeData,
) -> Result<(), DatabaseError> {
    for certification in &data.certifications {
        match certification {
            Certification::Name(name) => {
                tx.execute(
                    "INSERT INTO certifications (candidate_id, name, issuer) VALUES (?1, ?2, 'Unknown')",
                    params![candidate_id, name],
                )?;
            }
            Certification::Detailed(detail) => {
                tx.execute(
                    "INSERT INTO certifications (candidate_id, name, issuer, issue_date,
                     expiry_date, credential_id)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        candidate_id,
                        detail.name.as_deref().unwrap_or("Unknown Certification"),
                        detail.issuer.as_deref().unwrap_or("Unknown Issuer"),
                        normalized_date(detail.issue_date.as_deref()),
                        normalized_date(detail.expiry_date.as_deref()),
                        detail.credential_id,
                    ],
                )?;
            }
        }
    }
    Ok(())
}

/// Normalizes a raw date string to ISO form, or `NULL` when unparseable.
fn normalized_date(raw: Option<&str>) -> Option<String> {
    raw.and_then(parse_flexible_date).map(|d| d.to_string())
}
