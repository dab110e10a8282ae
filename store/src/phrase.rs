use anyhow::{Context, Result};
use rusqlite::{params, Connection, ErrorCode};

use pex::PhraseRow;

/// Result of one phrase insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// A UNIQUE constraint rejected the row (duplicate target/tag pair). The
    /// driver's error detail rides along so the caller can log or dead-letter
    /// the record.
    Conflict(String),
}

/// Result of one ingestion-batch insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaOutcome {
    /// The new `meta_id`.
    Saved(i64),
    Conflict(String),
}

/// One ingestion-batch row: a message that carried a screenshot.
#[derive(Debug, Clone)]
pub struct MetaRow {
    pub state: String,
    pub channel_id: String,
    pub message_id: i64,
    pub message_date: String,
    pub with_error: bool,
}

impl MetaRow {
    pub fn new(channel_id: impl Into<String>, message_id: i64, message_date: impl Into<String>) -> Self {
        Self {
            state: "todo".to_string(),
            channel_id: channel_id.into(),
            message_id,
            message_date: message_date.into(),
            with_error: false,
        }
    }
}

/// Insert one phrase row.
///
/// The columns bind positionally in the row's field order; that order is part
/// of the contract with the core and must not change.
pub fn insert_phrase(conn: &Connection, row: &PhraseRow) -> Result<SaveOutcome> {
    let result = conn.execute(
        "INSERT INTO phrase (
            meta_id,
            state,
            active,
            target,
            target_tag,
            translate,
            translate_tag,
            target_mask,
            translate_mask,
            message_id,
            message_date,
            metadata
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            row.meta_id,
            row.state,
            row.success,
            row.target,
            row.target_tag,
            row.translate,
            row.translate_tag,
            row.target_mask,
            row.translate_mask,
            row.message_id,
            row.message_date,
            row.metadata,
        ],
    );

    match result {
        Ok(_) => Ok(SaveOutcome::Saved),
        Err(err) if is_constraint_violation(&err) => Ok(SaveOutcome::Conflict(err.to_string())),
        Err(err) => Err(err).context("insert phrase"),
    }
}

/// Insert one ingestion-batch row, returning the new `meta_id`.
pub fn insert_meta(conn: &Connection, row: &MetaRow) -> Result<MetaOutcome> {
    let result = conn.execute(
        "INSERT INTO phrase_meta (
            state,
            channel_id,
            message_id,
            message_date,
            with_error
        )
        VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            row.state,
            row.channel_id,
            row.message_id,
            row.message_date,
            row.with_error,
        ],
    );

    match result {
        Ok(_) => Ok(MetaOutcome::Saved(conn.last_insert_rowid())),
        Err(err) if is_constraint_violation(&err) => Ok(MetaOutcome::Conflict(err.to_string())),
        Err(err) => Err(err).context("insert phrase_meta"),
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}
