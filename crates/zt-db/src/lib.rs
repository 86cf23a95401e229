//! Session store for the zone tracker.
//!
//! Persists recording sessions using `rusqlite`, one session per
//! (subject, training day) key.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! The tracker runs a single operator loop that owns the connection, so no
//! further synchronization is provided.
//!
//! # Schema
//!
//! - `sessions`: one row per key with creation and last-flush times (ISO 8601, UTC).
//! - `interval_records`: the ordered records of each session. `position` keeps
//!   insertion order; `start_time`/`end_time` hold `MM:SS:LLL` text and
//!   `end_time` is NULL for an open interval.
//!
//! Every flush rewrites a session's records inside one transaction, so an
//! interrupted process leaves either the previous or the new state on disk.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

use zt_core::{IntervalRecord, Session, SessionKey, Timestamp, TimestampError};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored interval timestamp could not be parsed.
    #[error("invalid timestamp in session {key} at position {position}: {value}")]
    InvalidTimestamp {
        key: SessionKey,
        position: usize,
        value: String,
        #[source]
        source: TimestampError,
    },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Stored session metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub key: SessionKey,
    pub record_count: usize,
    pub open_count: usize,
    pub created_at: String,
    pub updated_at: String,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        tracing::debug!(path = %path.display(), "opened session store");
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS sessions (
                subject INTEGER NOT NULL,
                day INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (subject, day)
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_updated ON sessions(updated_at);

            -- Interval records: one zone-occupancy span each
            -- start_time/end_time: 'MM:SS:LLL' session offsets, end_time NULL while open
            CREATE TABLE IF NOT EXISTS interval_records (
                subject INTEGER NOT NULL,
                day INTEGER NOT NULL,
                position INTEGER NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT,
                zone INTEGER NOT NULL,
                PRIMARY KEY (subject, day, position),
                FOREIGN KEY (subject, day) REFERENCES sessions(subject, day) ON DELETE CASCADE
            );
            ",
        )?;
        Ok(())
    }

    /// Loads the session for `key`, creating an empty one if none is stored.
    ///
    /// The key is registered on creation so an interrupted session can be
    /// resumed and shows up in [`Self::list_sessions`].
    pub fn load_or_create(&mut self, key: SessionKey) -> Result<Session, DbError> {
        self.load_or_create_at(key, Utc::now())
    }

    fn load_or_create_at(
        &mut self,
        key: SessionKey,
        now: DateTime<Utc>,
    ) -> Result<Session, DbError> {
        if let Some(session) = self.load_session(key)? {
            tracing::info!(%key, records = session.len(), "resuming session");
            return Ok(session);
        }

        let now = format_timestamp(now);
        self.conn.execute(
            "
            INSERT OR IGNORE INTO sessions (subject, day, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            ",
            params![key.subject, key.day, now, now],
        )?;
        tracing::info!(%key, "created session");
        Ok(Session::new(key))
    }

    /// Loads a stored session, or `None` if the key has never been used.
    pub fn load_session(&self, key: SessionKey) -> Result<Option<Session>, DbError> {
        let exists = self
            .conn
            .query_row(
                "SELECT 1 FROM sessions WHERE subject = ? AND day = ?",
                params![key.subject, key.day],
                |_| Ok(()),
            )
            .optional()?;
        if exists.is_none() {
            return Ok(None);
        }

        let mut stmt = self.conn.prepare(
            "
            SELECT position, start_time, end_time, zone
            FROM interval_records
            WHERE subject = ? AND day = ?
            ORDER BY position ASC
            ",
        )?;
        let rows = stmt.query_map(params![key.subject, key.day], |row| {
            Ok((
                row.get::<_, usize>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, u8>(3)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (position, start_time, end_time, zone) = row?;
            let start_time = parse_timestamp(&start_time, key, position)?;
            let end_time = end_time
                .map(|value| parse_timestamp(&value, key, position))
                .transpose()?;
            records.push(IntervalRecord {
                start_time,
                end_time,
                zone,
            });
        }
        tracing::debug!(%key, records = records.len(), "loaded session");
        Ok(Some(Session::with_records(key, records)))
    }

    /// Flushes a session, replacing whatever was stored for its key.
    pub fn save_session(&mut self, session: &Session) -> Result<(), DbError> {
        self.save_session_at(session, Utc::now())
    }

    fn save_session_at(&mut self, session: &Session, now: DateTime<Utc>) -> Result<(), DbError> {
        let key = session.key();
        let now = format_timestamp(now);
        let tx = self.conn.transaction()?;
        tx.execute(
            "
            INSERT INTO sessions (subject, day, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(subject, day) DO UPDATE SET updated_at = excluded.updated_at
            ",
            params![key.subject, key.day, now, now],
        )?;
        tx.execute(
            "DELETE FROM interval_records WHERE subject = ? AND day = ?",
            params![key.subject, key.day],
        )?;
        {
            let mut stmt = tx.prepare(
                "
                INSERT INTO interval_records (subject, day, position, start_time, end_time, zone)
                VALUES (?, ?, ?, ?, ?, ?)
                ",
            )?;
            for (position, record) in session.records().iter().enumerate() {
                stmt.execute(params![
                    key.subject,
                    key.day,
                    position,
                    record.start_time.to_string(),
                    record.end_time.map(|t| t.to_string()),
                    record.zone,
                ])?;
            }
        }
        tx.commit()?;
        tracing::debug!(%key, records = session.len(), "flushed session");
        Ok(())
    }

    /// Lists stored sessions ordered by subject then day.
    pub fn list_sessions(&self) -> Result<Vec<SessionSummary>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT s.subject, s.day, s.created_at, s.updated_at,
                   COUNT(r.position) AS record_count,
                   COALESCE(
                       SUM(
                           CASE WHEN r.position IS NOT NULL AND r.end_time IS NULL
                           THEN 1 ELSE 0 END
                       ),
                       0
                   ) AS open_count
            FROM sessions s
            LEFT JOIN interval_records r ON r.subject = s.subject AND r.day = s.day
            GROUP BY s.subject, s.day
            ORDER BY s.subject ASC, s.day ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SessionSummary {
                key: SessionKey::new(row.get(0)?, row.get(1)?),
                created_at: row.get(2)?,
                updated_at: row.get(3)?,
                record_count: row.get(4)?,
                open_count: row.get(5)?,
            })
        })?;
        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?);
        }
        Ok(sessions)
    }
}

fn parse_timestamp(value: &str, key: SessionKey, position: usize) -> Result<Timestamp, DbError> {
    value.parse().map_err(|source| DbError::InvalidTimestamp {
        key,
        position,
        value: value.to_string(),
        source,
    })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
