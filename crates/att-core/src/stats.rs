//! Attendance statistics over events and reconciled sessions.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::event::Event;
use crate::session::Session;

/// An optional calendar-date window.
///
/// Both bounds are inclusive; `to` extends through the end of its day, so
/// a range of `2025-03-10..=2025-03-10` covers the whole of March 10th.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// True when the instant falls inside the range.
    #[must_use]
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        let date = time.date_naive();
        if self.from.is_some_and(|from| date < from) {
            return false;
        }
        if self.to.is_some_and(|to| date > to) {
            return false;
        }
        true
    }
}

/// Keeps the events whose timestamp falls inside the range.
#[must_use]
pub fn filter_events(events: &[Event], range: DateRange) -> Vec<Event> {
    events
        .iter()
        .filter(|event| range.contains(event.time))
        .cloned()
        .collect()
}

/// Headline attendance counts for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// All sessions in the input.
    pub total: usize,
    /// Sessions whose check-in fell on the day.
    pub checked_in: usize,
    /// Sessions whose check-out fell on the day.
    pub checked_out: usize,
    /// Sessions with a check-in but no check-out, regardless of day.
    pub active_now: usize,
}

impl SessionStats {
    /// Counts sessions relative to the given calendar day.
    #[must_use]
    pub fn for_day(sessions: &[Session], date: NaiveDate) -> Self {
        Self {
            total: sessions.len(),
            checked_in: sessions
                .iter()
                .filter(|s| s.check_in_time.is_some_and(|t| t.date_naive() == date))
                .count(),
            checked_out: sessions
                .iter()
                .filter(|s| s.check_out_time.is_some_and(|t| t.date_naive() == date))
                .count(),
            active_now: sessions.iter().filter(|s| s.is_active()).count(),
        }
    }
}

/// Check-in/check-out totals for one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub check_ins: usize,
    pub check_outs: usize,
}

/// Groups session check-ins and check-outs by calendar date.
///
/// Dates come back ascending; a date appears when at least one check-in or
/// check-out fell on it.
#[must_use]
pub fn daily_activity(sessions: &[Session]) -> Vec<DailyActivity> {
    let mut by_date: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();
    for session in sessions {
        if let Some(time) = session.check_in_time {
            by_date.entry(time.date_naive()).or_default().0 += 1;
        }
        if let Some(time) = session.check_out_time {
            by_date.entry(time.date_naive()).or_default().1 += 1;
        }
    }
    by_date
        .into_iter()
        .map(|(date, (check_ins, check_outs))| DailyActivity {
            date,
            check_ins,
            check_outs,
        })
        .collect()
}
