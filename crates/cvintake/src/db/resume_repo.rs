//! Resume repository — CRUD operations for the `resumes` table.
//!
//! One row per uploaded file. The row is created at upload time and mutated
//! in place by each pipeline stage; the `metadata` column is a JSON bag
//! accumulating per-stage results via shallow top-level merge.

use rusqlite::{params, Row};
use serde_json::Value;

use super::{Database, DatabaseError};

/// A raw resume row from the database.
#[derive(Debug, Clone)]
pub struct ResumeRow {
    pub id: String,
    pub processing_id: String,
    pub original_file_name: String,
    pub file_path: String,
    pub file_size: u64,
    pub file_type: String,
    pub mime_type: Option<String>,
    pub uploaded_by: Option<String>,
    pub status: String,
    pub processing_stage: String,
    pub extracted_text: Option<String>,
    pub metadata: String,
    pub candidate_id: Option<String>,
    pub uploaded_at: String,
    pub updated_at: String,
}

impl ResumeRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            processing_id: row.get("processing_id")?,
            original_file_name: row.get("original_file_name")?,
            file_path: row.get("file_path")?,
            file_size: row.get("file_size")?,
            file_type: row.get("file_type")?,
            mime_type: row.get("mime_type")?,
            uploaded_by: row.get("uploaded_by")?,
            status: row.get("status")?,
            processing_stage: row.get("processing_stage")?,
            extracted_text: row.get("extracted_text")?,
            metadata: row.get("metadata")?,
            candidate_id: row.get("candidate_id")?,
            uploaded_at: row.get("uploaded_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Parses the metadata bag; a corrupt column yields an empty object.
    pub fn metadata_value(&self) -> Value {
        serde_json::from_str(&self.metadata).unwrap_or_else(|_| Value::Object(Default::default()))
    }
}

/// Inserts a new resume row.
pub fn insert(db: &Database, resume: &ResumeRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO resumes (id, processing_id, original_file_name, file_path, file_size,
             file_type, mime_type, uploaded_by, status, processing_stage, extracted_text,
             metadata, candidate_id, uploaded_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                resume.id,
                resume.processing_id,
                resume.original_file_name,
                resume.file_path,
                resume.file_size as i64,
                resume.file_type,
                resume.mime_type,
                resume.uploaded_by,
                resume.status,
                resume.processing_stage,
                resume.extracted_text,
                resume.metadata,
                resume.candidate_id,
                resume.uploaded_at,
                resume.updated_at,
            ],
        )?;
        Ok(())
    })
}

/// Finds a resume by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<ResumeRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM resumes WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], ResumeRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Updates status and processing stage.
pub fn update_status(
    db: &Database,
    id: &str,
    status: &str,
    stage: &str,
    updated_at: &str,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE resumes SET status = ?2, processing_stage = ?3, updated_at = ?4 WHERE id = ?1",
            params![id, status, stage, updated_at],
        )?;
        Ok(())
    })
}

/// Stores the extracted text along with the post-extraction status/stage.
pub fn update_extraction(
    db: &Database,
    id: &str,
    extracted_text: &str,
    status: &str,
    stage: &str,
    updated_at: &str,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE resumes SET extracted_text = ?2, status = ?3, processing_stage = ?4,
             updated_at = ?5 WHERE id = ?1",
            params![id, extracted_text, status, stage, updated_at],
        )?;
        Ok(())
    })
}

/// Records the durable location the upload was relocated to.
pub fn update_file_path(
    db: &Database,
    id: &str,
    file_path: &str,
    updated_at: &str,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE resumes SET file_path = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, file_path, updated_at],
        )?;
        Ok(())
    })
}

/// Links the materialized candidate to its source resume.
pub fn set_candidate(
    db: &Database,
    id: &str,
    candidate_id: &str,
    updated_at: &str,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE resumes SET candidate_id = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, candidate_id, updated_at],
        )?;
        Ok(())
    })
}

/// Shallow-merges a key into the metadata bag: existing top-level keys are
/// kept, the given key is replaced wholesale.
pub fn merge_metadata(
    db: &Database,
    id: &str,
    key: &str,
    value: &Value,
    updated_at: &str,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        let current: String = conn.query_row(
            "SELECT metadata FROM resumes WHERE id = ?1",
            params![id],
            |r| r.get(0),
        )?;

        let mut bag: Value =
            serde_json::from_str(&current).unwrap_or_else(|_| Value::Object(Default::default()));
        if !bag.is_object() {
            bag = Value::Object(Default::default());
        }
        bag.as_object_mut()
            .expect("bag forced to object above")
            .insert(key.to_string(), value.clone());

        let serialized = serde_json::to_string(&bag)?;
        conn.execute(
            "UPDATE resumes SET metadata = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, serialized, updated_at],
        )?;
        Ok(())
    })
}

/// Deletes a resume row (cascades to its processing logs).
pub fn delete(db: &Database, id: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute("DELETE FROM resumes WHERE id = ?1", params![id])?;
        Ok(())
    })
}
