use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create the phrase tables if they do not exist yet.
///
/// `phrase_meta` tracks one row per ingested message (the batch a screenshot
/// came from); `phrase` holds one row per extracted phrase pair. Duplicate
/// detection rides on the UNIQUE constraints: a message may only be ingested
/// once per channel, and a target sentence with the same tag words may only
/// be stored once.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS phrase_meta (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            state CHAR,
            channel_id CHAR,
            message_id INTEGER,
            message_date DATETIME,
            with_error BOOLEAN,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(channel_id, message_id)
        )",
        [],
    )
    .context("create phrase_meta")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS phrase (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            meta_id INTEGER,
            state CHAR,
            active BOOLEAN,
            target CHAR,
            target_tag CHAR,
            translate CHAR,
            translate_tag CHAR,
            target_mask CHAR,
            translate_mask CHAR,
            message_id INTEGER,
            message_date DATETIME,
            metadata CHAR,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(target, target_tag),
            FOREIGN KEY (meta_id) REFERENCES phrase_meta(id)
        )",
        [],
    )
    .context("create phrase")?;

    Ok(())
}
