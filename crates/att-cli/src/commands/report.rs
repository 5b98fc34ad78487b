//! Report command for attendance statistics.
//!
//! Prints the headline counts for one day plus the per-day activity series
//! derived from the reconciled sessions.

use std::io::Write;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use serde::Serialize;

use att_core::{DailyActivity, SessionStats, daily_activity, reconcile};
use att_db::Database;

/// JSON payload for `att report --json`.
#[derive(Debug, Serialize)]
struct ReportJson<'a> {
    date: NaiveDate,
    stats: SessionStats,
    daily_activity: &'a [DailyActivity],
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    date: Option<NaiveDate>,
    json: bool,
) -> Result<()> {
    let date = date.unwrap_or_else(|| Utc::now().date_naive());

    let events = db.list_events()?;
    let sessions = reconcile(&events);
    let stats = SessionStats::for_day(&sessions, date);
    let activity = daily_activity(&sessions);

    if json {
        let payload = ReportJson {
            date,
            stats,
            daily_activity: &activity,
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&payload)?)?;
        return Ok(());
    }

    writeln!(writer, "ATTENDANCE REPORT: {date}")?;
    writeln!(writer)?;
    writeln!(writer, "Sessions:     {}", stats.total)?;
    writeln!(writer, "Checked in:   {}", stats.checked_in)?;
    writeln!(writer, "Checked out:  {}", stats.checked_out)?;
    writeln!(writer, "Active now:   {}", stats.active_now)?;

    if !activity.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "DAILY ACTIVITY")?;
        writeln!(writer, "──────────────")?;
        for day in &activity {
            writeln!(
                writer,
                "{}  in {:>3}  out {:>3}",
                day.date, day.check_ins, day.check_outs
            )?;
        }
    }
    Ok(())
}
