//! Session reconstruction from the raw event log.
//!
//! The event log is a flat, unordered list of check-in/check-out events.
//! [`reconcile`] rebuilds the work sessions it implies: each check-in is
//! paired with the next unmatched check-out for the same user, and events
//! that cannot be paired still surface as partial sessions rather than
//! disappearing from the output.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::{Event, EventKind};
use crate::types::UserId;

/// A reconciled work session: one check-in paired with at most one check-out.
///
/// At least one of `check_in_time`/`check_out_time` is always present.
/// Sessions are derived, read-only output; they are never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Derived identifier: `"{in}-{out}"` for a pair, `"out-{out}"` for an
    /// orphan checkout, the check-in event's id for an open session.
    pub id: String,
    /// The user the session belongs to.
    pub user_id: UserId,
    /// Display name, falling back to the user id.
    pub name: String,
    /// Present iff an `in` event was matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in_time: Option<DateTime<Utc>>,
    /// Present iff an `out` event was matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_out_time: Option<DateTime<Utc>>,
    /// Filled by [`crate::enrich::enrich`]; `None` until then.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// Filled by [`crate::enrich::enrich`]; `None` until then.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub laptop_brand: Option<String>,
}

impl Session {
    /// True when both a check-in and a check-out were matched.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.check_in_time.is_some() && self.check_out_time.is_some()
    }

    /// True when the session has a check-in but no check-out yet.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.check_in_time.is_some() && self.check_out_time.is_none()
    }

    /// Time between check-in and check-out, when both are present.
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        Some(self.check_out_time? - self.check_in_time?)
    }
}

/// Name recorded on the event, ignoring empty strings.
fn display_name(event: &Event) -> Option<String> {
    event.name.clone().filter(|name| !name.is_empty())
}

/// Rebuilds work sessions from an unordered event log.
///
/// Events are processed in chronological order via a stable sort, so equal
/// timestamps keep their input order. Per user, a check-out closes the
/// currently open check-in; a check-out with no open check-in becomes a
/// checkout-only session, and a check-in still open at the end of the log
/// becomes an in-progress session. A second check-in before a matching
/// check-out silently replaces the open one: only the latest check-in is
/// live, and the superseded event emits no session of its own.
///
/// The returned list puts the most recently emitted session first.
#[must_use]
pub fn reconcile(events: &[Event]) -> Vec<Session> {
    let mut ordered: Vec<&Event> = events.iter().collect();
    ordered.sort_by_key(|event| event.time);

    let mut open_by_user: HashMap<String, &Event> = HashMap::new();
    let mut sessions: Vec<Session> = Vec::new();

    for event in ordered {
        let key = event.user_id.matching_key();
        match event.kind {
            EventKind::In => {
                if let Some(superseded) = open_by_user.insert(key, event) {
                    tracing::debug!(
                        user = %superseded.user_id,
                        event = %superseded.id,
                        "open check-in superseded before any checkout"
                    );
                }
            }
            EventKind::Out => {
                if let Some(open) = open_by_user.remove(&key) {
                    sessions.push(Session {
                        id: format!("{}-{}", open.id, event.id),
                        user_id: event.user_id.clone(),
                        name: display_name(open)
                            .or_else(|| display_name(event))
                            .unwrap_or_else(|| event.user_id.to_string()),
                        check_in_time: Some(open.time),
                        check_out_time: Some(event.time),
                        department: None,
                        laptop_brand: None,
                    });
                } else {
                    sessions.push(Session {
                        id: format!("out-{}", event.id),
                        user_id: event.user_id.clone(),
                        name: display_name(event)
                            .unwrap_or_else(|| event.user_id.to_string()),
                        check_in_time: None,
                        check_out_time: Some(event.time),
                        department: None,
                        laptop_brand: None,
                    });
                }
            }
        }
    }

    // Remaining open check-ins become in-progress sessions, oldest first so
    // the final reversal shows the most recent one on top.
    let mut still_open: Vec<&Event> = open_by_user.into_values().collect();
    still_open.sort_by(|a, b| {
        a.time
            .cmp(&b.time)
            .then_with(|| a.id.as_str().cmp(b.id.as_str()))
    });
    for open in still_open {
        sessions.push(Session {
            id: open.id.to_string(),
            user_id: open.user_id.clone(),
            name: display_name(open).unwrap_or_else(|| open.user_id.to_string()),
            check_in_time: Some(open.time),
            check_out_time: None,
            department: None,
            laptop_brand: None,
        });
    }

    sessions.reverse();
    sessions
}

/// True when the user's most recent event is a check-in.
///
/// User matching is case-insensitive. When several events share the latest
/// timestamp, the one appended last wins.
#[must_use]
pub fn is_checked_in(events: &[Event], user: &str) -> bool {
    let mut latest: Option<&Event> = None;
    for event in events {
        if !event.user_id.matches(user) {
            continue;
        }
        if latest.is_none_or(|seen| event.time >= seen.time) {
            latest = Some(event);
        }
    }
    latest.is_some_and(|event| event.kind == EventKind::In)
}

/// Why a check-in/check-out action was refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckError {
    /// The user already has a live check-in.
    #[error("{user} is already checked in; check out before checking in again")]
    AlreadyCheckedIn { user: String },

    /// The user has no live check-in to close.
    #[error("{user} is not checked in")]
    NotCheckedIn { user: String },
}

/// Validates a check-in/check-out action against the user's presence.
///
/// Refuses a check-in while one is already live and a check-out with
/// nothing to close. This guard runs before an event is appended; the
/// reconciler itself accepts any log and never fails.
pub fn authorize(events: &[Event], user: &str, kind: EventKind) -> Result<(), CheckError> {
    let currently_in = is_checked_in(events, user);
    match kind {
        EventKind::In if currently_in => Err(CheckError::AlreadyCheckedIn {
            user: user.to_string(),
        }),
        EventKind::Out if !currently_in => Err(CheckError::NotCheckedIn {
            user: user.to_string(),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventId;
    use chrono::TimeZone;

    fn ts(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0)
            .single()
            .expect("valid test timestamp")
            + Duration::minutes(minutes)
    }

    fn event(id: &str, user: &str, kind: EventKind, time: DateTime<Utc>) -> Event {
        Event {
            id: EventId::new(id).unwrap(),
            user_id: UserId::new(user).unwrap(),
            kind,
            time,
            name: None,
        }
    }

    fn named(id: &str, user: &str, kind: EventKind, time: DateTime<Utc>, name: &str) -> Event {
        Event {
            name: Some(name.to_string()),
            ..event(id, user, kind, time)
        }
    }

    #[test]
    fn empty_input_produces_empty_output() {
        assert_eq!(reconcile(&[]), Vec::new());
    }

    #[test]
    fn simple_pair_produces_one_completed_session() {
        let events = vec![
            event("e1", "alice", EventKind::In, ts(0)),
            event("e2", "alice", EventKind::Out, ts(30)),
        ];

        let sessions = reconcile(&events);

        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, "e1-e2");
        assert_eq!(sessions[0].check_in_time, Some(ts(0)));
        assert_eq!(sessions[0].check_out_time, Some(ts(30)));
        assert!(sessions[0].is_complete());
        assert_eq!(sessions[0].duration(), Some(Duration::minutes(30)));
    }

    #[test]
    fn input_order_does_not_matter() {
        let forward = vec![
            event("e1", "alice", EventKind::In, ts(0)),
            event("e2", "alice", EventKind::Out, ts(30)),
        ];
        let reversed: Vec<Event> = forward.iter().rev().cloned().collect();

        assert_eq!(reconcile(&forward), reconcile(&reversed));
    }

    #[test]
    fn orphan_checkout_produces_checkout_only_session() {
        let events = vec![event("e1", "alice", EventKind::Out, ts(0))];

        let sessions = reconcile(&events);

        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, "out-e1");
        assert_eq!(sessions[0].check_in_time, None);
        assert_eq!(sessions[0].check_out_time, Some(ts(0)));
        assert!(!sessions[0].is_active());
    }

    #[test]
    fn lone_check_in_produces_open_session() {
        let events = vec![event("e1", "alice", EventKind::In, ts(0))];

        let sessions = reconcile(&events);

        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, "e1");
        assert_eq!(sessions[0].check_in_time, Some(ts(0)));
        assert_eq!(sessions[0].check_out_time, None);
        assert!(sessions[0].is_active());
    }

    // The first check-in is dropped without a session of its own, not
    // reported as an error.
    #[test]
    fn second_check_in_supersedes_the_first() {
        let events = vec![
            event("e1", "alice", EventKind::In, ts(0)),
            event("e2", "alice", EventKind::In, ts(10)),
            event("e3", "alice", EventKind::Out, ts(20)),
        ];

        let sessions = reconcile(&events);

        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, "e2-e3");
        assert_eq!(sessions[0].check_in_time, Some(ts(10)));
        assert_eq!(sessions[0].check_out_time, Some(ts(20)));
    }

    #[test]
    fn users_never_cross_pair() {
        let events = vec![
            event("a1", "alice", EventKind::In, ts(0)),
            event("b1", "bob", EventKind::In, ts(5)),
            event("b2", "bob", EventKind::Out, ts(15)),
            event("a2", "alice", EventKind::Out, ts(25)),
        ];

        let sessions = reconcile(&events);

        assert_eq!(sessions.len(), 2);
        // Most recently emitted first: alice's pair closed after bob's.
        assert_eq!(sessions[0].id, "a1-a2");
        assert_eq!(sessions[1].id, "b1-b2");
    }

    #[test]
    fn user_matching_is_case_insensitive() {
        let events = vec![
            event("e1", "Alice", EventKind::In, ts(0)),
            event("e2", "alice", EventKind::Out, ts(30)),
        ];

        let sessions = reconcile(&events);

        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, "e1-e2");
    }

    #[test]
    fn equal_timestamps_keep_input_order() {
        // Check-in and check-out at the same instant: the in was appended
        // first, so the stable sort pairs them instead of orphaning the out.
        let events = vec![
            event("e1", "alice", EventKind::In, ts(0)),
            event("e2", "alice", EventKind::Out, ts(0)),
        ];

        let sessions = reconcile(&events);

        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, "e1-e2");
    }

    #[test]
    fn most_recently_emitted_session_comes_first() {
        let events = vec![
            event("e1", "alice", EventKind::In, ts(0)),
            event("e2", "alice", EventKind::Out, ts(10)),
            event("e3", "alice", EventKind::In, ts(20)),
        ];

        let sessions = reconcile(&events);

        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id, "e3");
        assert_eq!(sessions[1].id, "e1-e2");
    }

    #[test]
    fn every_unpaired_event_still_surfaces() {
        let events = vec![
            event("e1", "alice", EventKind::Out, ts(0)),
            event("e2", "alice", EventKind::In, ts(10)),
            event("e3", "bob", EventKind::In, ts(20)),
        ];

        let sessions = reconcile(&events);

        // One orphan checkout plus two open sessions.
        assert_eq!(sessions.len(), 3);
        assert!(sessions.iter().all(|s| {
            s.check_in_time.is_some() || s.check_out_time.is_some()
        }));
    }

    #[test]
    fn session_name_prefers_the_check_in_event() {
        let events = vec![
            named("e1", "alice", EventKind::In, ts(0), "Alice A."),
            named("e2", "alice", EventKind::Out, ts(30), "alice"),
        ];

        let sessions = reconcile(&events);
        assert_eq!(sessions[0].name, "Alice A.");
    }

    #[test]
    fn session_name_falls_back_to_user_id() {
        let events = vec![event("e1", "alice", EventKind::Out, ts(0))];

        let sessions = reconcile(&events);
        assert_eq!(sessions[0].name, "alice");
    }

    #[test]
    fn empty_event_name_is_ignored() {
        let events = vec![named("e1", "alice", EventKind::In, ts(0), "")];

        let sessions = reconcile(&events);
        assert_eq!(sessions[0].name, "alice");
    }

    #[test]
    fn is_checked_in_follows_latest_event() {
        let mut events = vec![event("e1", "alice", EventKind::In, ts(0))];
        assert!(is_checked_in(&events, "alice"));
        assert!(is_checked_in(&events, "ALICE"));
        assert!(!is_checked_in(&events, "bob"));

        events.push(event("e2", "alice", EventKind::Out, ts(10)));
        assert!(!is_checked_in(&events, "alice"));
    }

    #[test]
    fn authorize_rejects_double_check_in() {
        let events = vec![event("e1", "alice", EventKind::In, ts(0))];

        let err = authorize(&events, "alice", EventKind::In).unwrap_err();
        assert_eq!(
            err,
            CheckError::AlreadyCheckedIn {
                user: "alice".to_string()
            }
        );
        assert!(authorize(&events, "alice", EventKind::Out).is_ok());
    }

    #[test]
    fn authorize_rejects_checkout_without_check_in() {
        let err = authorize(&[], "alice", EventKind::Out).unwrap_err();
        assert_eq!(
            err,
            CheckError::NotCheckedIn {
                user: "alice".to_string()
            }
        );
        assert!(authorize(&[], "alice", EventKind::In).is_ok());
    }
}
