//! Check-in and check-out commands.
//!
//! Appends a new event to the log after validating it against the user's
//! current presence, then trims the log to the configured retention limit.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

use att_core::{Event, EventId, EventKind, UserId, authorize};
use att_db::Database;

/// Records a check-in or check-out for `user`.
///
/// A check-in while one is already live, or a check-out with nothing to
/// close, is refused before anything is written. The recorded display name
/// is the `--name` argument, falling back to the user's registration.
pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    kind: EventKind,
    user: &str,
    name: Option<&str>,
    history_limit: usize,
) -> Result<()> {
    let events = db.list_events()?;
    authorize(&events, user, kind)?;

    let name = match name {
        Some(name) => Some(name.to_string()),
        None => db.get_registration(user)?.map(|reg| reg.name),
    };

    let event = Event {
        id: EventId::new(Uuid::new_v4().to_string()).context("generated event ID was empty")?,
        user_id: UserId::new(user).context("user ID cannot be empty")?,
        kind,
        time: Utc::now(),
        name,
    };
    db.append_event(&event)?;

    let pruned = db.prune_events(history_limit)?;
    if pruned > 0 {
        tracing::debug!(pruned, history_limit, "trimmed event log");
    }

    writeln!(
        writer,
        "Checked {} {} at {}",
        kind,
        user,
        event.time.to_rfc3339_opts(SecondsFormat::Secs, true)
    )?;
    Ok(())
}
