//! Status command for showing who is currently checked in.

use std::io::Write;

use anyhow::Result;

use att_core::{is_checked_in, reconcile};
use att_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &Database, user: Option<&str>) -> Result<()> {
    let events = db.list_events()?;

    if let Some(user) = user {
        if is_checked_in(&events, user) {
            writeln!(writer, "{user} is checked in.")?;
        } else {
            writeln!(writer, "{user} is not checked in.")?;
        }
        return Ok(());
    }

    let sessions = reconcile(&events);
    let active: Vec<_> = sessions.iter().filter(|s| s.is_active()).collect();

    writeln!(writer, "Attendance status")?;
    if active.is_empty() {
        writeln!(writer, "No one is currently checked in.")?;
        return Ok(());
    }

    writeln!(writer, "Currently checked in:")?;
    for session in active {
        // is_active guarantees the check-in time is present.
        let since = session
            .check_in_time
            .map_or_else(String::new, |t| t.format("%Y-%m-%d %H:%M").to_string());
        writeln!(writer, "- {} (since {})", session.name, since)?;
    }
    Ok(())
}
