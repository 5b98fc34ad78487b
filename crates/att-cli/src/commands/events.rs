//! Events command: dumps the raw log as JSONL for debugging.

use std::io::Write;

use anyhow::Result;

use att_db::Database;

/// Writes every stored event as one JSON line, in append order.
pub fn run<W: Write>(writer: &mut W, db: &Database) -> Result<()> {
    for event in db.list_events()? {
        writeln!(writer, "{}", serde_json::to_string(&event)?)?;
    }
    Ok(())
}
