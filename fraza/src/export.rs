//! Chat-export ingestion.
//!
//! The source channel is archived as a directory with a `result.json` file
//! and the referenced photo files. Only photo-bearing `message` entries are
//! interesting; service messages and text-only posts are skipped.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::Deserialize;

use pex::{OwnedImage, Pipeline, Recognizer, RecordMeta, State, DATETIME_FORMAT};
use store::{Connection, MetaOutcome, MetaRow, SaveOutcome};

#[derive(Debug, Deserialize)]
pub struct ChatExport {
    pub messages: Vec<ExportMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ExportMessage {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub date: String,
    #[serde(default)]
    pub photo: Option<String>,
}

impl ChatExport {
    /// Load `result.json` from an export directory.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join("result.json");
        let json =
            std::fs::read_to_string(&path).with_context(|| format!("read {:?}", path))?;
        serde_json::from_str(&json).with_context(|| format!("parse {:?}", path))
    }

    pub fn photo_messages(&self) -> impl Iterator<Item = &ExportMessage> {
        self.messages
            .iter()
            .filter(|m| m.kind == "message" && m.photo.is_some())
    }
}

impl ExportMessage {
    pub fn photo_path(&self, dir: &Path) -> Option<PathBuf> {
        self.photo.as_ref().map(|p| dir.join(p))
    }

    pub fn parsed_date(&self) -> Result<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.date, DATETIME_FORMAT)
            .with_context(|| format!("parse message date {:?}", self.date))
    }
}

#[derive(Debug, Default)]
pub struct ImportStats {
    pub messages: usize,
    pub records: usize,
    pub saved: usize,
    pub conflicts: usize,
    pub errors: usize,
}

/// Walk an export directory and persist every extracted phrase pair.
///
/// Skipped or conflicting items never abort the walk: an already-ingested
/// message, a duplicate phrase, an unreadable photo, and a block that failed
/// to split are all counted, logged, and stepped over.
pub fn import<R: Recognizer>(
    dir: &Path,
    channel: &str,
    pipeline: &Pipeline<R>,
    conn: &Connection,
) -> Result<ImportStats> {
    let export = ChatExport::load(dir)?;
    let mut stats = ImportStats::default();

    for message in export.photo_messages() {
        let date = match message.parsed_date() {
            Ok(date) => date,
            Err(err) => {
                tracing::warn!(message_id = message.id, error = %err, "bad message date");
                continue;
            }
        };

        let meta_row = MetaRow::new(channel, message.id, date.format(DATETIME_FORMAT).to_string());
        let meta_id = match store::insert_meta(conn, &meta_row)? {
            MetaOutcome::Saved(id) => id,
            MetaOutcome::Conflict(detail) => {
                tracing::info!(message_id = message.id, %detail, "message already ingested");
                stats.conflicts += 1;
                continue;
            }
        };

        let photo = message
            .photo_path(dir)
            .expect("photo_messages yields photo-bearing messages");
        let image = match OwnedImage::open(&photo) {
            Ok(image) => image,
            Err(err) => {
                tracing::warn!(message_id = message.id, error = %err, "unreadable photo");
                continue;
            }
        };

        stats.messages += 1;

        let meta = RecordMeta {
            meta_id: Some(meta_id),
            message_id: message.id,
            message_date: date,
        };

        for record in pipeline.process(&image, &meta) {
            stats.records += 1;
            if record.state() == State::Error {
                stats.errors += 1;
            }

            match store::insert_phrase(conn, &record.row())? {
                SaveOutcome::Saved => stats.saved += 1,
                SaveOutcome::Conflict(detail) => {
                    tracing::warn!(
                        message_id = message.id,
                        file_index = record.file_index(),
                        %detail,
                        "duplicate phrase"
                    );
                    stats.conflicts += 1;
                }
            }
        }
    }

    Ok(stats)
}
