//! SQLite persistence for parsed phrase records.
//!
//! The core never opens or closes connections; callers pass one in. Inserts
//! report uniqueness conflicts as structured outcomes instead of errors, so a
//! batch import can route duplicates without aborting.

use anyhow::{Context, Result};

mod phrase;
pub use phrase::*;
mod schema;
pub use schema::*;

pub use rusqlite::Connection;

pub fn open(path: impl AsRef<std::path::Path>) -> Result<Connection> {
    let path = path.as_ref();
    Connection::open(path).with_context(|| format!("open database {:?}", path))
}
