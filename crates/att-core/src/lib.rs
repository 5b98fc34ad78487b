//! Core domain logic for the attendance tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Session reconciliation: pairing check-in/check-out events into work sessions
//! - Enrichment: joining sessions against registration records
//! - Statistics: headline counts and per-day activity
//!
//! Everything here is a pure computation over in-memory collections; the
//! event log itself is owned by a storage collaborator and passed in.

pub mod enrich;
pub mod event;
pub mod session;
pub mod stats;
pub mod types;

pub use enrich::{DEFAULT_DEPARTMENT, DEFAULT_LAPTOP_BRAND, Registration, enrich};
pub use event::{Event, EventKind, UnknownEventKind};
pub use session::{CheckError, Session, authorize, is_checked_in, reconcile};
pub use stats::{DailyActivity, DateRange, SessionStats, daily_activity, filter_events};
pub use types::{EventId, UserId, ValidationError};
