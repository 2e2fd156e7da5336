//! Processing-log repository — append-only stage records per resume.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// One processing-log entry. Entries are append-only and ordered by start
/// time; status pollers read the most recent ones.
#[derive(Debug, Clone)]
pub struct LogRow {
    pub id: i64,
    pub resume_id: String,
    pub step: String,
    pub status: String,
    pub message: Option<String>,
    pub error_details: Option<String>,
    pub started_at: String,
    pub completed_at: Option<String>,
}

impl LogRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            resume_id: row.get("resume_id")?,
            step: row.get("step")?,
            status: row.get("status")?,
            message: row.get("message")?,
            error_details: row.get("error_details")?,
            started_at: row.get("started_at")?,
            completed_at: row.get("completed_at")?,
        })
    }
}

/// Appends a log entry. Terminal statuses (`COMPLETED`, `FAILED`) get their
/// completion timestamp stamped immediately.
pub fn append(
    db: &Database,
    resume_id: &str,
    step: &str,
    status: &str,
    message: Option<&str>,
    error_details: Option<&str>,
    now: &str,
) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        let completed_at = if status == "COMPLETED" || status == "FAILED" {
            Some(now)
        } else {
            None
        };

        conn.execute(
            "INSERT INTO processing_logs (resume_id, step, status, message, error_details,
             started_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![resume_id, step, status, message, error_details, now, completed_at],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Returns the most recent entries for a resume, newest first.
pub fn recent(db: &Database, resume_id: &str, limit: u32) -> Result<Vec<LogRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM processing_logs WHERE resume_id = ?1
             ORDER BY started_at DESC, id DESC LIMIT ?2",
        )?;
        let rows: Vec<LogRow> = stmt
            .query_map(params![resume_id, limit], LogRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Deletes all log entries for a resume.
pub fn delete_for_resume(db: &Database, resume_id: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "DELETE FROM processing_logs WHERE resume_id = ?1",
            params![resume_id],
        )?;
        Ok(())
    })
}
