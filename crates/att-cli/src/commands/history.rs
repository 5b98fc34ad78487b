//! History command: the reconciled session table.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};

use att_core::{DateRange, enrich, filter_events, reconcile};
use att_db::Database;

/// Shows reconciled, enriched work sessions, most recent first.
///
/// Events can be narrowed to one user and to a calendar-date range before
/// reconciliation; with `--json` each session is printed as one JSON line.
pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    user: Option<&str>,
    range: DateRange,
    json: bool,
) -> Result<()> {
    let mut events = db.list_events()?;
    if let Some(user) = user {
        events.retain(|event| event.user_id.matches(user));
    }
    let events = filter_events(&events, range);

    let mut sessions = reconcile(&events);
    enrich(&mut sessions, &db.list_registrations()?);

    if json {
        for session in &sessions {
            writeln!(writer, "{}", serde_json::to_string(session)?)?;
        }
        return Ok(());
    }

    if sessions.is_empty() {
        writeln!(writer, "No records yet.")?;
        return Ok(());
    }

    writeln!(
        writer,
        "{:<20}  {:<12}  {:<8}  {:<16}  {}",
        "NAME", "DEPARTMENT", "LAPTOP", "CHECK-IN", "CHECK-OUT"
    )?;
    for session in &sessions {
        writeln!(
            writer,
            "{:<20}  {:<12}  {:<8}  {:<16}  {}",
            session.name,
            session.department.as_deref().unwrap_or("-"),
            session.laptop_brand.as_deref().unwrap_or("-"),
            format_time(session.check_in_time),
            format_time(session.check_out_time),
        )?;
    }
    Ok(())
}

/// Renders a timestamp for the table, `-` when absent.
fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map_or_else(
        || "-".to_string(),
        |t| t.format("%Y-%m-%d %H:%M").to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use att_core::{Event, EventId, EventKind, Registration, Session, UserId};
    use chrono::TimeZone;
    use insta::assert_snapshot;

    fn event(id: &str, user: &str, kind: EventKind, hour: u32, name: Option<&str>) -> Event {
        Event {
            id: EventId::new(id).unwrap(),
            user_id: UserId::new(user).unwrap(),
            kind,
            time: Utc.with_ymd_and_hms(2025, 3, 10, hour, 0, 0).unwrap(),
            name: name.map(String::from),
        }
    }

    fn seeded_db() -> Database {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_events(&[
            event("e1", "alice", EventKind::In, 9, Some("Alice")),
            event("e2", "alice", EventKind::Out, 17, Some("Alice")),
            event("e3", "bob", EventKind::In, 13, Some("Bob")),
        ])
        .unwrap();
        db.upsert_registration(&Registration {
            user_id: UserId::new("alice").unwrap(),
            name: "Alice".to_string(),
            department: Some("Engineering".to_string()),
            laptop_brand: Some("Dell".to_string()),
        })
        .unwrap();
        db
    }

    #[test]
    fn table_shows_enriched_sessions_newest_first() {
        let db = seeded_db();
        let mut out = Vec::new();

        run(&mut out, &db, None, DateRange::default(), false).unwrap();

        let out = String::from_utf8(out).unwrap();
        assert_snapshot!(out.trim_end(), @r"
        NAME                  DEPARTMENT    LAPTOP    CHECK-IN          CHECK-OUT
        Bob                   General       -         2025-03-10 13:00  -
        Alice                 Engineering   Dell      2025-03-10 09:00  2025-03-10 17:00
        ");
    }

    #[test]
    fn user_filter_is_case_insensitive() {
        let db = seeded_db();
        let mut out = Vec::new();

        run(&mut out, &db, Some("ALICE"), DateRange::default(), true).unwrap();

        let out = String::from_utf8(out).unwrap();
        assert_eq!(out.lines().count(), 1);
        assert!(out.contains("\"id\":\"e1-e2\""));
    }

    #[test]
    fn date_range_narrows_events_before_pairing() {
        let db = seeded_db();
        let mut out = Vec::new();
        let range = DateRange {
            from: Some(chrono::NaiveDate::from_ymd_opt(2025, 3, 11).unwrap()),
            to: None,
        };

        run(&mut out, &db, None, range, false).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "No records yet.\n");
    }

    #[test]
    fn json_outputs_one_session_per_line() {
        let db = seeded_db();
        let mut out = Vec::new();

        run(&mut out, &db, None, DateRange::default(), true).unwrap();

        let out = String::from_utf8(out).unwrap();
        let sessions: Vec<Session> = out
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(sessions.len(), 2);
        assert!(sessions[0].is_active());
        assert!(sessions[1].is_complete());
    }
}
