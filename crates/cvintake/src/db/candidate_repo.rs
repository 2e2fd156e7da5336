//! Candidate repository — read side of the materialized candidate graph.
//!
//! Writes happen inside the materializer's transaction; this module loads
//! the finished graph back for callers.

use rusqlite::{params, Connection, Row};

use super::{Database, DatabaseError};

#[derive(Debug, Clone)]
pub struct CandidateRow {
    pub id: String,
    pub resume_id: String,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub summary: Option<String>,
    pub years_experience: i64,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl CandidateRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            resume_id: row.get("resume_id")?,
            full_name: row.get("full_name")?,
            email: row.get("email")?,
            phone: row.get("phone")?,
            location: row.get("location")?,
            summary: row.get("summary")?,
            years_experience: row.get("years_experience")?,
            status: row.get("status")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct WorkExperienceRow {
    pub id: i64,
    pub company: String,
    pub position: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub is_current: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EducationRow {
    pub id: i64,
    pub institution: String,
    pub degree: String,
    pub field: Option<String>,
    pub start_year: Option<i64>,
    pub end_year: Option<i64>,
    pub gpa: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct CertificationRow {
    pub id: i64,
    pub name: String,
    pub issuer: String,
    pub issue_date: Option<String>,
    pub expiry_date: Option<String>,
    pub credential_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SkillRow {
    pub id: i64,
    pub name: String,
    pub category: String,
}

/// A skill attached to a candidate, with the join's proficiency score.
#[derive(Debug, Clone)]
pub struct CandidateSkill {
    pub skill: SkillRow,
    pub proficiency: f64,
}

/// The full materialized graph for one candidate.
#[derive(Debug, Clone)]
pub struct CandidateGraph {
    pub candidate: CandidateRow,
    pub work_experience: Vec<WorkExperienceRow>,
    pub education: Vec<EducationRow>,
    pub skills: Vec<CandidateSkill>,
    pub certifications: Vec<CertificationRow>,
}

/// Finds a candidate row by ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<CandidateRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM candidates WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], CandidateRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Loads a candidate with all related rows.
pub fn load_graph(db: &Database, id: &str) -> Result<Option<CandidateGraph>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM candidates WHERE id = ?1")?;
        let candidate = match stmt
            .query_map(params![id], CandidateRow::from_row)?
            .next()
            .transpose()?
        {
            Some(row) => row,
            None => return Ok(None),
        };

        Ok(Some(CandidateGraph {
            work_experience: load_work_experience(conn, id)?,
            education: load_education(conn, id)?,
            skills: load_skills(conn, id)?,
            certifications: load_certifications(conn, id)?,
            candidate,
        }))
    })
}

/// Looks up a catalog skill by name. The unique index collates
/// case-insensitively, so "python" finds "Python".
pub fn find_skill_by_name(db: &Database, name: &str) -> Result<Option<SkillRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT id, name, category FROM skills WHERE name = ?1 COLLATE NOCASE")?;
        let mut rows = stmt.query_map(params![name], |row| {
            Ok(SkillRow {
                id: row.get(0)?,
                name: row.get(1)?,
                category: row.get(2)?,
            })
        })?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Counts catalog rows matching a name case-insensitively (dedup checks).
pub fn count_skills_named(db: &Database, name: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM skills WHERE name = ?1 COLLATE NOCASE",
            params![name],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}

fn load_work_experience(
    conn: &Connection,
    candidate_id: &str,
) -> Result<Vec<WorkExperienceRow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, company, position, start_date, end_date, is_current, description
         FROM work_experience WHERE candidate_id = ?1 ORDER BY id",
    )?;
    let rows = stmt
        .query_map(params![candidate_id], |row| {
            Ok(WorkExperienceRow {
                id: row.get(0)?,
                company: row.get(1)?,
                position: row.get(2)?,
                start_date: row.get(3)?,
                end_date: row.get(4)?,
                is_current: row.get(5)?,
                description: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn load_education(
    conn: &Connection,
    candidate_id: &str,
) -> Result<Vec<EducationRow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, institution, degree, field, start_year, end_year, gpa
         FROM education WHERE candidate_id = ?1 ORDER BY id",
    )?;
    let rows = stmt
        .query_map(params![candidate_id], |row| {
            Ok(EducationRow {
                id: row.get(0)?,
                institution: row.get(1)?,
                degree: row.get(2)?,
                field: row.get(3)?,
                start_year: row.get(4)?,
                end_year: row.get(5)?,
                gpa: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn load_skills(conn: &Connection, candidate_id: &str) -> Result<Vec<CandidateSkill>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT s.id, s.name, s.category, cs.proficiency
         FROM candidate_skills cs JOIN skills s ON s.id = cs.skill_id
         WHERE cs.candidate_id = ?1 ORDER BY s.name",
    )?;
    let rows = stmt
        .query_map(params![candidate_id], |row| {
            Ok(CandidateSkill {
                skill: SkillRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    category: row.get(2)?,
                },
                proficiency: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn load_certifications(
    conn: &Connection,
    candidate_id: &str,
) -> Result<Vec<CertificationRow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, issuer, issue_date, expiry_date, credential_id
         FROM certifications WHERE candidate_id = ?1 ORDER BY id",
    )?;
    let rows = stmt
        .query_map(params![candidate_id], |row| {
            Ok(CertificationRow {
                id: row.get(0)?,
                name: row.get(1)?,
                issuer: row.get(2)?,
                issue_date: row.get(3)?,
                expiry_date: row.get(4)?,
                credential_id: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
