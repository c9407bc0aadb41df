//! Upload record persistence.
//!
//! Follows the same pattern as `subscriptions.rs`: raw SQL with rusqlite.
//! A transcript is written as soon as it exists so a later denial or failure
//! never loses it.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::upload::UploadPhase;

/// An upload record from the database.
#[derive(Debug, Clone, Serialize)]
pub struct UploadRecord {
    pub id: i64,
    pub user_id: String,
    pub file_name: String,
    pub phase: String,
    pub meeting_id: Option<String>,
    pub transcript_text: Option<String>,
    pub summary_id: Option<String>,
    pub error: Option<String>,
    pub created_at: String,
    pub completed_at: Option<String>,
}

const COLUMNS: &str = "id, user_id, file_name, phase, meeting_id, transcript_text, summary_id, \
                       error, created_at, completed_at";

/// Repository for upload records.
pub struct UploadRepository;

impl UploadRepository {
    /// Insert a new upload (phase = uploading). Returns the new id.
    pub fn insert(conn: &Connection, user_id: &str, file_name: &str) -> Result<i64> {
        conn.execute(
            "INSERT INTO uploads (user_id, file_name, phase) VALUES (?1, ?2, ?3)",
            params![user_id, file_name, UploadPhase::Uploading.as_str()],
        )
        .context("Failed to insert upload")?;

        Ok(conn.last_insert_rowid())
    }

    pub fn update_phase(conn: &Connection, id: i64, phase: UploadPhase) -> Result<()> {
        conn.execute(
            "UPDATE uploads SET phase = ?1 WHERE id = ?2",
            params![phase.as_str(), id],
        )
        .context("Failed to update upload phase")?;
        Ok(())
    }

    pub fn record_transcript(conn: &Connection, id: i64, meeting_id: &str, text: &str) -> Result<()> {
        conn.execute(
            "UPDATE uploads SET meeting_id = ?1, transcript_text = ?2 WHERE id = ?3",
            params![meeting_id, text, id],
        )
        .context("Failed to record transcript")?;
        Ok(())
    }

    /// Close the upload in a terminal phase (`done` or `payment_required`).
    pub fn finish(
        conn: &Connection,
        id: i64,
        phase: UploadPhase,
        summary_id: Option<&str>,
    ) -> Result<()> {
        conn.execute(
            "UPDATE uploads SET phase = ?1, summary_id = ?2, completed_at = CURRENT_TIMESTAMP \
             WHERE id = ?3",
            params![phase.as_str(), summary_id, id],
        )
        .context("Failed to finish upload")?;
        Ok(())
    }

    pub fn fail(conn: &Connection, id: i64, error: &str) -> Result<()> {
        conn.execute(
            "UPDATE uploads SET phase = ?1, error = ?2, completed_at = CURRENT_TIMESTAMP WHERE id = ?3",
            params![UploadPhase::Error.as_str(), error, id],
        )
        .context("Failed to mark upload as failed")?;
        Ok(())
    }

    /// Get one of `user_id`'s uploads.
    pub fn get(conn: &Connection, user_id: &str, id: i64) -> Result<Option<UploadRecord>> {
        conn.query_row(
            &format!("SELECT {} FROM uploads WHERE id = ?1 AND user_id = ?2", COLUMNS),
            params![id, user_id],
            Self::from_row,
        )
        .optional()
        .context("Failed to query upload")
    }

    /// List a user's uploads, newest first.
    pub fn list(conn: &Connection, user_id: &str, limit: usize) -> Result<Vec<UploadRecord>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM uploads WHERE user_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2",
                COLUMNS
            ))
            .context("Failed to prepare uploads list query")?;

        let rows = stmt
            .query_map(params![user_id, limit as i64], Self::from_row)
            .context("Failed to list uploads")?;

        let mut uploads = Vec::new();
        for row in rows {
            uploads.push(row?);
        }

        Ok(uploads)
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<UploadRecord> {
        Ok(UploadRecord {
            id: row.get(0)?,
            user_id: row.get(1)?,
            file_name: row.get(2)?,
            phase: row.get(3)?,
            meeting_id: row.get(4)?,
            transcript_text: row.get(5)?,
            summary_id: row.get(6)?,
            error: row.get(7)?,
            created_at: row.get(8)?,
            completed_at: row.get(9)?,
        })
    }
}
