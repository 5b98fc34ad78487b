//! Storage layer for the attendance tracker.
//!
//! Provides persistence for check-in/check-out events and registration
//! records using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send`
//! but not `Sync`: an instance can be moved between threads but not shared
//! without external synchronization.
//!
//! # Schema
//!
//! Timestamps are stored as TEXT in ISO 8601 (e.g. `2025-03-10T09:00:00Z`),
//! always UTC, so lexicographic ordering matches chronological ordering.
//! Events are returned in append order (`rowid`); session reconciliation
//! re-sorts by timestamp, and append order is what its stable sort
//! preserves for equal timestamps.
//!
//! Rows that fail to parse degrade instead of aborting a read: an
//! unparseable timestamp falls back to the Unix epoch (a conservative
//! minimum for ordering) and a row whose type column is not `in`/`out` is
//! skipped. Both are logged.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

use att_core::{Event, EventId, EventKind, Registration, UserId};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection
    /// closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// Idempotent, safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- Events table: the append-only check-in/check-out log.
            -- time: ISO 8601 format (e.g. '2025-03-10T09:00:00Z')
            -- type: 'in' or 'out'
            CREATE TABLE IF NOT EXISTS events (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                type TEXT NOT NULL,
                time TEXT NOT NULL,
                name TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_events_time ON events(time);
            CREATE INDEX IF NOT EXISTS idx_events_user ON events(user_id);

            CREATE TABLE IF NOT EXISTS registrations (
                user_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                department TEXT,
                laptop_brand TEXT
            );
            ",
        )?;
        Ok(())
    }

    /// Appends a single event to the log.
    pub fn append_event(&mut self, event: &Event) -> Result<(), DbError> {
        self.insert_events(std::slice::from_ref(event))?;
        Ok(())
    }

    /// Inserts a batch of events, ignoring duplicates by ID.
    ///
    /// Returns the number of rows actually inserted.
    pub fn insert_events(&mut self, events: &[Event]) -> Result<usize, DbError> {
        if events.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "
                INSERT OR IGNORE INTO events (id, user_id, type, time, name)
                VALUES (?, ?, ?, ?, ?)
                ",
            )?;
            for event in events {
                inserted += stmt.execute(params![
                    event.id.as_str(),
                    event.user_id.as_str(),
                    event.kind.as_str(),
                    format_timestamp(event.time),
                    event.name,
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    /// Lists all events in append order.
    ///
    /// Malformed rows degrade rather than failing the whole read; see the
    /// [module documentation](self).
    pub fn list_events(&self) -> Result<Vec<Event>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, user_id, type, time, name
            FROM events
            ORDER BY rowid ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(RawEvent {
                id: row.get(0)?,
                user_id: row.get(1)?,
                kind: row.get(2)?,
                time: row.get(3)?,
                name: row.get(4)?,
            })
        })?;

        let mut events = Vec::new();
        for row in rows {
            if let Some(event) = row?.into_event() {
                events.push(event);
            }
        }
        Ok(events)
    }

    /// Number of events currently in the log.
    pub fn count_events(&self) -> Result<usize, DbError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Deletes all but the most recently appended `keep` events.
    ///
    /// Returns the number of rows deleted. This is the retention policy of
    /// the event log, not of derived sessions (which are never stored).
    pub fn prune_events(&mut self, keep: usize) -> Result<usize, DbError> {
        let deleted = self.conn.execute(
            "
            DELETE FROM events
            WHERE rowid NOT IN (
                SELECT rowid FROM events ORDER BY rowid DESC LIMIT ?
            )
            ",
            params![i64::try_from(keep).unwrap_or(i64::MAX)],
        )?;
        Ok(deleted)
    }

    /// Inserts or replaces the registration for a user.
    pub fn upsert_registration(&mut self, registration: &Registration) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO registrations (user_id, name, department, laptop_brand)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                name = excluded.name,
                department = excluded.department,
                laptop_brand = excluded.laptop_brand
            ",
            params![
                registration.user_id.as_str(),
                registration.name,
                registration.department,
                registration.laptop_brand,
            ],
        )?;
        Ok(())
    }

    /// Looks up a registration by user id, ignoring case.
    pub fn get_registration(&self, user: &str) -> Result<Option<Registration>, DbError> {
        let row = self
            .conn
            .query_row(
                "
                SELECT user_id, name, department, laptop_brand
                FROM registrations
                WHERE user_id = ? COLLATE NOCASE
                ",
                params![user],
                |row| {
                    Ok(RawRegistration {
                        user_id: row.get(0)?,
                        name: row.get(1)?,
                        department: row.get(2)?,
                        laptop_brand: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(row.and_then(RawRegistration::into_registration))
    }

    /// Lists all registrations ordered by user id.
    pub fn list_registrations(&self) -> Result<Vec<Registration>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT user_id, name, department, laptop_brand
            FROM registrations
            ORDER BY user_id ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(RawRegistration {
                user_id: row.get(0)?,
                name: row.get(1)?,
                department: row.get(2)?,
                laptop_brand: row.get(3)?,
            })
        })?;

        let mut registrations = Vec::new();
        for row in rows {
            if let Some(registration) = row?.into_registration() {
                registrations.push(registration);
            }
        }
        Ok(registrations)
    }
}

/// Formats a timestamp for storage.
fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// An event row as stored, before validation.
struct RawEvent {
    id: String,
    user_id: String,
    kind: String,
    time: String,
    name: Option<String>,
}

impl RawEvent {
    /// Converts a stored row into a typed event.
    ///
    /// Rows with an unrecognized type or an empty id are skipped with a
    /// warning; an unparseable timestamp falls back to the Unix epoch so
    /// the event still sorts ahead of everything well-formed.
    fn into_event(self) -> Option<Event> {
        let kind: EventKind = match self.kind.parse() {
            Ok(kind) => kind,
            Err(err) => {
                tracing::warn!(event = %self.id, error = %err, "skipping event row");
                return None;
            }
        };
        let time = match DateTime::parse_from_rfc3339(&self.time) {
            Ok(time) => time.with_timezone(&Utc),
            Err(err) => {
                tracing::warn!(
                    event = %self.id,
                    timestamp = %self.time,
                    error = %err,
                    "unparseable timestamp, treating as epoch"
                );
                DateTime::UNIX_EPOCH
            }
        };
        let (Ok(id), Ok(user_id)) = (EventId::new(self.id), UserId::new(self.user_id)) else {
            tracing::warn!("skipping event row with empty id or user id");
            return None;
        };
        Some(Event {
            id,
            user_id,
            kind,
            time,
            name: self.name,
        })
    }
}

/// A registration row as stored, before validation.
struct RawRegistration {
    user_id: String,
    name: String,
    department: Option<String>,
    laptop_brand: Option<String>,
}

impl RawRegistration {
    fn into_registration(self) -> Option<Registration> {
        let Ok(user_id) = UserId::new(self.user_id) else {
            tracing::warn!("skipping registration row with empty user id");
            return None;
        };
        Some(Registration {
            user_id,
            name: self.name,
            department: self.department,
            laptop_brand: self.laptop_brand,
        })
    }
}
